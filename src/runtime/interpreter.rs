// src/runtime/interpreter.rs
//! Rule interpreter: evaluates one promotion against a cart context
//!
//! Produces logic-derived events first, then DSL-derived events. Compiled
//! DSL ASTs are cached; a compile failure or logic error skips only that
//! promotion's contribution and is logged, never raised.

use std::sync::Arc;

use serde_json::Value as JsonValue;
use tracing::{debug, warn};

use crate::cache::{cache_key, AstCache};
use crate::events::{DiscountEvent, EventKind};
use crate::parser::ast::{Condition, RuleSet};
use crate::parser::compile;
use crate::Promotion;

use super::context::EvalContext;

pub struct RuleInterpreter {
    cache: AstCache,
    compile_count: u64,
}

impl RuleInterpreter {
    pub fn new(cache_capacity: usize) -> Self {
        Self {
            cache: AstCache::new(cache_capacity),
            compile_count: 0,
        }
    }

    /// Evaluate a promotion's structured logic and DSL against the context.
    pub fn evaluate(&mut self, promotion: &Promotion, ctx: &EvalContext) -> Vec<DiscountEvent> {
        let mut events = Vec::new();

        if let Some(logic) = &promotion.logic {
            match logic.evaluate(ctx) {
                Ok(Some(payload)) => {
                    events.extend(payload_events(promotion, &payload));
                }
                Ok(None) => {}
                Err(err) => {
                    warn!(
                        promo_id = %promotion.id,
                        error = %err,
                        "logic evaluation failed, skipping this promotion's logic"
                    );
                }
            }
        }

        if let Some(dsl) = &promotion.dsl {
            if let Some(ast) = self.compiled(&promotion.id, dsl) {
                events.extend(dsl_events(promotion, &ast, ctx));
            }
        }

        events
    }

    /// Fetch the compiled AST for a promotion's DSL, compiling on a cache
    /// miss. Returns `None` when the DSL does not compile.
    fn compiled(&mut self, promo_id: &str, dsl: &str) -> Option<Arc<RuleSet>> {
        let key = cache_key(promo_id, dsl);

        if let Some(ast) = self.cache.get(key) {
            return Some(ast);
        }

        match compile(dsl) {
            Ok(ast) => {
                self.compile_count += 1;
                let ast = Arc::new(ast);
                self.cache.set(key, Arc::clone(&ast));
                Some(ast)
            }
            Err(err) => {
                warn!(
                    promo_id = %promo_id,
                    error = %err,
                    "DSL compile failed, skipping this promotion's rules"
                );
                None
            }
        }
    }

    pub fn cache(&self) -> &AstCache {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut AstCache {
        &mut self.cache
    }

    /// Number of successful DSL compilations since construction.
    pub fn compile_count(&self) -> u64 {
        self.compile_count
    }
}

impl Default for RuleInterpreter {
    fn default() -> Self {
        Self::new(crate::cache::DEFAULT_CACHE_CAPACITY)
    }
}

/// Normalize a logic `then` payload (one action object or an array of them)
/// into events.
fn payload_events(promotion: &Promotion, payload: &JsonValue) -> Vec<DiscountEvent> {
    let objects: Vec<_> = match payload {
        JsonValue::Object(object) => vec![object],
        JsonValue::Array(items) => items.iter().filter_map(JsonValue::as_object).collect(),
        other => {
            debug!(
                promo_id = %promotion.id,
                payload = %other,
                "ignoring non-object logic payload"
            );
            Vec::new()
        }
    };

    objects
        .into_iter()
        .map(|object| DiscountEvent {
            promo_id: promotion.id.clone(),
            description: promotion.name.clone(),
            kind: EventKind::from_action_object(object),
        })
        .collect()
}

fn dsl_events(promotion: &Promotion, ast: &RuleSet, ctx: &EvalContext) -> Vec<DiscountEvent> {
    ast.rules
        .iter()
        .filter(|rule| condition_holds(&rule.condition, ctx))
        .filter_map(|rule| EventKind::from_rule_action(&rule.action, rule.label.clone()))
        .map(|kind| DiscountEvent {
            promo_id: promotion.id.clone(),
            description: promotion.name.clone(),
            kind,
        })
        .collect()
}

fn condition_holds(condition: &Condition, ctx: &EvalContext) -> bool {
    match condition {
        Condition::CategoryMetric {
            category,
            metric,
            op,
            value,
        } => {
            // Only `amount` is live; other metrics are reserved.
            metric == "amount" && op.compare(ctx.category_total(category), *value)
        }
        Condition::CartMetric { metric, op, value } => {
            metric == "total" && op.compare(ctx.cart_total, *value)
        }
        Condition::Unknown => false,
    }
}

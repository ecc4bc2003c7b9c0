// src/engine/mod.rs
//! Discount application engine
//!
//! Orchestrates the whole pipeline: fetches candidate promotions from the
//! catalog, enforces stacking/exclusion, dispatches to built-in template
//! evaluators or the rule interpreter, applies discount events to cloned
//! cart lines, and accumulates the applied-promotion ledger.

pub mod kind;
pub mod templates;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::cache::{CacheEntrySnapshot, CacheStats};
use crate::catalog::PromotionCatalog;
use crate::events::{DiscountEvent, EventKind};
use crate::runtime::context::EvalContext;
use crate::runtime::interpreter::RuleInterpreter;
use crate::{round2, AppliedPromotion, CartLine, EngineConfig};

pub use kind::PromotionKind;

/// Result of one `apply_promotions` pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyOutcome {
    /// Discounted cart lines (the caller's input is never mutated).
    pub lines: Vec<CartLine>,

    /// Ledger of promotions that produced a discount, in application order.
    pub applied_promotions: Vec<AppliedPromotion>,

    /// Sum of all applied discounts, rounded to 2 decimal places.
    pub promotion_discount_total: f64,
}

pub struct DiscountEngine<C> {
    catalog: C,
    interpreter: RuleInterpreter,
}

impl<C: PromotionCatalog> DiscountEngine<C> {
    pub fn new(catalog: C) -> Self {
        Self::with_config(catalog, EngineConfig::default())
    }

    pub fn with_config(catalog: C, config: EngineConfig) -> Self {
        Self {
            catalog,
            interpreter: RuleInterpreter::new(config.ast_cache_capacity),
        }
    }

    /// Apply the active promotions for a branch to a cart.
    ///
    /// Candidates arrive from the catalog already filtered and ordered by
    /// descending priority; the engine trusts that ordering. A catalog
    /// failure applies no promotions rather than failing the cart.
    pub fn apply_promotions(
        &mut self,
        lines: &[CartLine],
        branch_id: &str,
        now_iso: &str,
    ) -> ApplyOutcome {
        let promotions = match self.catalog.active(branch_id, now_iso) {
            Ok(promotions) => promotions,
            Err(err) => {
                warn!(
                    branch_id,
                    error = %err,
                    "catalog lookup failed, applying no promotions"
                );
                Vec::new()
            }
        };

        let mut lines = lines.to_vec();
        let mut applied: Vec<AppliedPromotion> = Vec::new();
        let mut total_discount = 0.0;

        for promotion in &promotions {
            // Once anything has applied, every later non-stackable
            // promotion is skipped.
            if !promotion.stackable && !applied.is_empty() {
                debug!(promo_id = %promotion.id, "skipped: non-stackable after prior application");
                continue;
            }

            if promotion
                .excludes
                .iter()
                .any(|id| applied.iter().any(|a| &a.promo_id == id))
            {
                debug!(promo_id = %promotion.id, "skipped: excluded by an applied promotion");
                continue;
            }

            let before = cart_total(&lines);

            match PromotionKind::from_promotion(promotion) {
                Ok(PromotionKind::Custom) => {
                    let applied_ids: Vec<String> =
                        applied.iter().map(|a| a.promo_id.clone()).collect();
                    let ctx = EvalContext::new(&lines, &applied_ids);
                    let events = self.interpreter.evaluate(promotion, &ctx);
                    for event in &events {
                        apply_event(&mut lines, event);
                    }
                }
                Ok(PromotionKind::BuyXGetY(cfg)) => templates::buy_x_get_y(&mut lines, &cfg),
                Ok(PromotionKind::SecondDiscount(cfg)) => {
                    templates::second_discount(&mut lines, &cfg)
                }
                Ok(PromotionKind::ComboFixed(cfg)) => templates::combo_fixed(&mut lines, &cfg),
                Ok(PromotionKind::PercentCart(cfg)) => templates::percent_cart(&mut lines, &cfg),
                Err(err) => {
                    warn!(
                        promo_id = %promotion.id,
                        error = %err,
                        "invalid template config, skipping promotion"
                    );
                    continue;
                }
            }

            let discount = round2(before - cart_total(&lines));
            if discount > 0.0 {
                applied.push(AppliedPromotion {
                    promo_id: promotion.id.clone(),
                    description: promotion.name.clone(),
                    discount_amount: discount,
                });
                total_discount += discount;
            }
        }

        ApplyOutcome {
            lines,
            applied_promotions: applied,
            promotion_discount_total: round2(total_discount),
        }
    }

    /// Aggregate AST-cache counters for dashboards.
    pub fn cache_stats(&self) -> CacheStats {
        self.interpreter.cache().stats()
    }

    /// Per-entry AST-cache view for dashboards.
    pub fn cache_snapshot(&self) -> Vec<CacheEntrySnapshot> {
        self.interpreter.cache().snapshot()
    }

    /// Administrative cache reset.
    pub fn clear_cache(&mut self) {
        self.interpreter.cache_mut().clear();
    }

    pub fn interpreter(&self) -> &RuleInterpreter {
        &self.interpreter
    }
}

/// Apply one discount event to the cart lines.
///
/// Cart-level discounts are sunk into the first line (not distributed),
/// clamped at 0. Custom events have no line-mutation handler.
fn apply_event(lines: &mut [CartLine], event: &DiscountEvent) {
    match &event.kind {
        EventKind::DiscountPercentCart { percent, .. } => {
            let discount = round2(cart_total(lines) * percent / 100.0);
            subtract_from_first_line(lines, discount);
        }
        EventKind::DiscountFixedCart { amount, .. } => {
            subtract_from_first_line(lines, round2(*amount));
        }
        EventKind::BuyXGetY {
            product_id,
            buy_qty,
            get_qty,
        } => {
            templates::buy_x_get_y(
                lines,
                &kind::BuyXGetYConfig {
                    product_id: product_id.clone(),
                    buy_qty: *buy_qty,
                    get_qty: *get_qty,
                },
            );
        }
        EventKind::Custom { name, .. } => {
            debug!(
                promo_id = %event.promo_id,
                event = %name,
                "no line-mutation handler for custom event"
            );
        }
    }
}

fn subtract_from_first_line(lines: &mut [CartLine], discount: f64) {
    if let Some(line) = lines.first_mut() {
        line.line_total = (line.line_total - discount).max(0.0);
    }
}

fn cart_total(lines: &[CartLine]) -> f64 {
    lines.iter().map(|l| l.line_total).sum()
}

// src/lib.rs
//! # Promo Rule Engine
//!
//! A promotion rule compiler and discount application engine for retail
//! point-of-sale carts. Promotions are either built-in structured templates
//! (buy-X-get-Y, second-unit discount, fixed-price combo, percent-off-cart)
//! or custom rules: a structured boolean/action expression tree and a small
//! textual DSL compiled to an AST and cached with LFU eviction.
//!
//! ## Example
//!
//! ```rust
//! use promo_rule_engine::{CartLine, DiscountEngine, Promotion, PromotionType, StaticCatalog};
//! use serde_json::json;
//!
//! let promo = Promotion::new("p-10", "10% off everything", PromotionType::PercentCart)
//!     .with_config(json!({ "percent": 10.0 }));
//!
//! let mut engine = DiscountEngine::new(StaticCatalog::new(vec![promo]));
//! let cart = vec![CartLine::new("espresso", "Espresso", 4, 300.0)];
//!
//! let outcome = engine.apply_promotions(&cart, "branch-1", "2025-06-01T12:00:00Z");
//! assert_eq!(outcome.promotion_discount_total, 120.0);
//! assert_eq!(outcome.lines[0].line_total, 1080.0);
//! ```

pub mod cache;
pub mod catalog;
pub mod engine;
pub mod events;
pub mod parser;
pub mod runtime;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use cache::{AstCache, CacheEntrySnapshot, CacheStats};
pub use catalog::{CatalogError, PromotionCatalog, StaticCatalog};
pub use engine::{ApplyOutcome, DiscountEngine, PromotionKind};
pub use events::{DiscountEvent, EventKind};
pub use parser::ast::{CompareOp, RuleSet};
pub use runtime::context::EvalContext;
pub use runtime::interpreter::RuleInterpreter;
pub use runtime::logic::LogicExpr;

/// Errors that can occur while compiling DSL source into a rule AST.
///
/// Both variants aggregate the individual lexer/parser messages collected
/// during the best-effort scan, joined with `"; "`.
#[derive(Error, Debug)]
pub enum CompileError {
    #[error("lexical error: {0}")]
    Lex(String),

    #[error("syntax error: {0}")]
    Syntax(String),
}

/// Catalog promotion type, selecting a built-in template or custom rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PromotionType {
    BuyXGetY,
    SecondDiscount,
    ComboFixed,
    PercentCart,
    Custom,
}

/// A catalog promotion (read-only input to the engine).
///
/// Template types carry their parameters in `config`; `Custom` promotions
/// carry a structured `logic` tree and/or a `dsl` program. Eligibility
/// filtering (`active`, branch, validity window) is the catalog's job.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Promotion {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub promo_type: PromotionType,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub stackable: bool,
    #[serde(default)]
    pub excludes: Vec<String>,
    #[serde(default)]
    pub config: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logic: Option<LogicExpr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dsl: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_to: Option<String>,
    #[serde(default)]
    pub applies_to_branch_ids: Vec<String>,
}

fn default_true() -> bool {
    true
}

impl Promotion {
    pub fn new(id: impl Into<String>, name: impl Into<String>, promo_type: PromotionType) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            promo_type,
            active: true,
            priority: 0,
            stackable: false,
            excludes: Vec::new(),
            config: serde_json::Value::Null,
            logic: None,
            dsl: None,
            valid_from: None,
            valid_to: None,
            applies_to_branch_ids: Vec::new(),
        }
    }

    pub fn with_config(mut self, config: serde_json::Value) -> Self {
        self.config = config;
        self
    }

    pub fn with_logic(mut self, logic: LogicExpr) -> Self {
        self.logic = Some(logic);
        self
    }

    pub fn with_dsl(mut self, dsl: impl Into<String>) -> Self {
        self.dsl = Some(dsl.into());
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_stackable(mut self, stackable: bool) -> Self {
        self.stackable = stackable;
        self
    }

    pub fn with_excludes(mut self, excludes: Vec<String>) -> Self {
        self.excludes = excludes;
        self
    }

    pub fn with_validity(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.valid_from = Some(from.into());
        self.valid_to = Some(to.into());
        self
    }

    pub fn with_branches(mut self, branch_ids: Vec<String>) -> Self {
        self.applies_to_branch_ids = branch_ids;
        self
    }

    /// Whether this promotion routes through the rule interpreter rather
    /// than a built-in template evaluator.
    pub fn has_custom_rules(&self) -> bool {
        self.promo_type == PromotionType::Custom || self.logic.is_some() || self.dsl.is_some()
    }
}

/// One cart line item.
///
/// `line_total` starts at `qty * unit_price` and is mutated downward as
/// discounts are applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product_id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub qty: u32,
    pub unit_price: f64,
    pub line_total: f64,
}

impl CartLine {
    pub fn new(
        product_id: impl Into<String>,
        name: impl Into<String>,
        qty: u32,
        unit_price: f64,
    ) -> Self {
        Self {
            product_id: product_id.into(),
            name: name.into(),
            category: None,
            qty,
            unit_price,
            line_total: round2(f64::from(qty) * unit_price),
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }
}

/// Ledger entry for a promotion that produced a discount greater than zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedPromotion {
    pub promo_id: String,
    pub description: String,
    pub discount_amount: f64,
}

/// Engine tunables.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    /// Maximum number of compiled DSL ASTs kept in the cache.
    pub ast_cache_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ast_cache_capacity: cache::DEFAULT_CACHE_CAPACITY,
        }
    }
}

/// Round a monetary amount to 2 decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// src/runtime/context.rs
//! Cart evaluation context derived from the current line state
//!
//! Rebuilt before each promotion evaluation so totals always reflect the
//! discounts applied so far. Never persisted.

use crate::CartLine;
use ahash::HashMap;

use super::logic::LogicError;

#[derive(Debug, Clone)]
pub struct EvalContext {
    /// Snapshot of the cart lines at evaluation time.
    pub lines: Vec<CartLine>,

    /// Sum of `line_total` over all lines.
    pub cart_total: f64,

    /// Sum of `line_total` per category (uncategorized lines are omitted).
    pub category_totals: HashMap<String, f64>,

    /// Ids of promotions applied so far, in application order.
    pub applied_promos: Vec<String>,
}

impl EvalContext {
    pub fn new(lines: &[CartLine], applied_promos: &[String]) -> Self {
        let cart_total = lines.iter().map(|l| l.line_total).sum();

        let mut category_totals: HashMap<String, f64> = HashMap::default();
        for line in lines {
            if let Some(category) = &line.category {
                *category_totals.entry(category.clone()).or_insert(0.0) += line.line_total;
            }
        }

        Self {
            lines: lines.to_vec(),
            cart_total,
            category_totals,
            applied_promos: applied_promos.to_vec(),
        }
    }

    /// Total for a category, 0 when the category is absent from the cart.
    pub fn category_total(&self, category: &str) -> f64 {
        self.category_totals.get(category).copied().unwrap_or(0.0)
    }

    /// Resolve a named variable for structured logic evaluation.
    ///
    /// Supported names: `cartTotal`, `lineCount`, `appliedCount`, and
    /// `category.<name>` for a category total.
    pub fn var(&self, name: &str) -> Result<f64, LogicError> {
        if let Some(category) = name.strip_prefix("category.") {
            return Ok(self.category_total(category));
        }

        match name {
            "cartTotal" => Ok(self.cart_total),
            "lineCount" => Ok(self.lines.len() as f64),
            "appliedCount" => Ok(self.applied_promos.len() as f64),
            _ => Err(LogicError::UnknownVariable(name.to_string())),
        }
    }
}

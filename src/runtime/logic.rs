// src/runtime/logic.rs
//! Structured boolean/action expression trees
//!
//! A promotion's `logic` field is a small expression tree written as JSON:
//!
//! ```json
//! {
//!   "when": { "all": [
//!     { "var": "cartTotal", "op": ">", "value": 100 },
//!     { "var": "category.Drinks", "op": ">=", "value": 20 }
//!   ]},
//!   "then": { "discountPercentCart": 10 }
//! }
//! ```
//!
//! The `then` payload is one action object or an array of them; recognized
//! keys map to discount events, everything else becomes a custom event.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;

use crate::parser::ast::CompareOp;

use super::context::EvalContext;

/// Errors raised while evaluating a logic tree. These are swallowed per
/// promotion by the interpreter, never surfaced to the caller.
#[derive(Error, Debug)]
pub enum LogicError {
    #[error("unknown variable: {0}")]
    UnknownVariable(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LogicExpr {
    /// Condition guarding one or more action objects.
    When {
        when: Box<LogicExpr>,
        then: JsonValue,
    },

    /// Conjunction: true when every branch is true.
    All { all: Vec<LogicExpr> },

    /// Disjunction: true when any branch is true.
    Any { any: Vec<LogicExpr> },

    Not { not: Box<LogicExpr> },

    /// Numeric comparison against a context variable.
    Cmp {
        var: String,
        op: CompareOp,
        value: f64,
    },

    Bool(bool),
}

impl LogicExpr {
    /// Evaluate the tree, returning the action payload of a satisfied
    /// `when` node. A bare boolean tree selects no actions.
    pub fn evaluate(&self, ctx: &EvalContext) -> Result<Option<JsonValue>, LogicError> {
        if let LogicExpr::When { when, then } = self {
            return Ok(when.truthy(ctx)?.then(|| then.clone()));
        }

        self.truthy(ctx)?;
        Ok(None)
    }

    fn truthy(&self, ctx: &EvalContext) -> Result<bool, LogicError> {
        match self {
            // A nested `when` contributes only its condition.
            LogicExpr::When { when, .. } => when.truthy(ctx),
            LogicExpr::All { all } => {
                for expr in all {
                    if !expr.truthy(ctx)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            LogicExpr::Any { any } => {
                for expr in any {
                    if expr.truthy(ctx)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            LogicExpr::Not { not } => Ok(!not.truthy(ctx)?),
            LogicExpr::Cmp { var, op, value } => Ok(op.compare(ctx.var(var)?, *value)),
            LogicExpr::Bool(b) => Ok(*b),
        }
    }
}

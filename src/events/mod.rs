// src/events/mod.rs
//! Discount events emitted by rule evaluation
//!
//! Events are the output of evaluating a promotion's logic and DSL rules:
//! typed instructions not yet applied to lines. The engine is responsible
//! for turning them into line mutations.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::parser::ast::RuleAction;

/// Typed discount instruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum EventKind {
    /// Discount the cart by a percentage of its current total.
    DiscountPercentCart {
        percent: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
    },

    /// Discount the cart by a fixed amount.
    DiscountFixedCart {
        amount: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
    },

    /// Free units per buy+get block of a product.
    BuyXGetY {
        product_id: String,
        buy_qty: u32,
        get_qty: u32,
    },

    /// Unrecognized action object, carried through for the caller.
    Custom {
        name: String,
        #[serde(default)]
        params: Map<String, JsonValue>,
    },
}

/// An event attributed to the promotion that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountEvent {
    pub promo_id: String,
    pub description: String,
    #[serde(flatten)]
    pub kind: EventKind,
}

impl EventKind {
    /// Map a logic action object to an event through the table of
    /// recognized keys. Unrecognized objects become [`EventKind::Custom`].
    pub fn from_action_object(object: &Map<String, JsonValue>) -> EventKind {
        if let Some(value) = object.get("discountPercentCart") {
            return EventKind::DiscountPercentCart {
                percent: value.as_f64().unwrap_or(0.0),
                label: label_of(object),
            };
        }

        if let Some(value) = object.get("discountFixedCart") {
            return EventKind::DiscountFixedCart {
                amount: value.as_f64().unwrap_or(0.0),
                label: label_of(object),
            };
        }

        if let Some(value) = object.get("buyXGetY") {
            return EventKind::BuyXGetY {
                product_id: value
                    .get("productId")
                    .and_then(JsonValue::as_str)
                    .unwrap_or_default()
                    .to_string(),
                buy_qty: qty_of(value, "buyQty"),
                get_qty: qty_of(value, "getQty"),
            };
        }

        EventKind::Custom {
            name: object
                .keys()
                .next()
                .cloned()
                .unwrap_or_else(|| "custom".to_string()),
            params: object.clone(),
        }
    }

    /// Map a DSL rule action to an event. `Noop` produces nothing.
    pub fn from_rule_action(action: &RuleAction, label: Option<String>) -> Option<EventKind> {
        match action {
            RuleAction::DiscountPercentCart { percent } => Some(EventKind::DiscountPercentCart {
                percent: *percent,
                label,
            }),
            RuleAction::DiscountFixedCart { amount } => Some(EventKind::DiscountFixedCart {
                amount: *amount,
                label,
            }),
            RuleAction::BuyXGetY {
                product_id,
                buy_qty,
                get_qty,
            } => Some(EventKind::BuyXGetY {
                product_id: product_id.clone(),
                buy_qty: buy_qty.max(0.0) as u32,
                get_qty: get_qty.max(0.0) as u32,
            }),
            RuleAction::Noop => None,
        }
    }
}

fn label_of(object: &Map<String, JsonValue>) -> Option<String> {
    object
        .get("label")
        .and_then(JsonValue::as_str)
        .map(ToString::to_string)
}

fn qty_of(value: &JsonValue, field: &str) -> u32 {
    value
        .get(field)
        .and_then(JsonValue::as_f64)
        .map(|q| q.max(0.0) as u32)
        .unwrap_or(0)
}

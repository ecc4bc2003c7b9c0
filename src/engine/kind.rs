// src/engine/kind.rs
//! Promotion dispatch: one tagged variant per built-in template
//!
//! The kind is decoded once per promotion from `type` + `config` and drives
//! both built-in evaluation and routing of custom promotions through the
//! rule interpreter.

use serde::Deserialize;
use thiserror::Error;

use crate::{Promotion, PromotionType};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuyXGetYConfig {
    pub product_id: String,
    pub buy_qty: u32,
    pub get_qty: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecondDiscountConfig {
    pub product_id: String,
    pub second_percent: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComboFixedConfig {
    pub combo_products: Vec<String>,
    pub combo_price: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PercentCartConfig {
    pub percent: f64,
}

/// A promotion's resolved evaluation strategy.
#[derive(Debug, Clone)]
pub enum PromotionKind {
    BuyXGetY(BuyXGetYConfig),
    SecondDiscount(SecondDiscountConfig),
    ComboFixed(ComboFixedConfig),
    PercentCart(PercentCartConfig),
    Custom,
}

#[derive(Error, Debug)]
#[error("invalid promotion config: {0}")]
pub struct ConfigError(#[from] serde_json::Error);

impl PromotionKind {
    pub fn from_promotion(promotion: &Promotion) -> Result<Self, ConfigError> {
        if promotion.has_custom_rules() {
            return Ok(PromotionKind::Custom);
        }

        let config = promotion.config.clone();
        let kind = match promotion.promo_type {
            PromotionType::BuyXGetY => PromotionKind::BuyXGetY(serde_json::from_value(config)?),
            PromotionType::SecondDiscount => {
                PromotionKind::SecondDiscount(serde_json::from_value(config)?)
            }
            PromotionType::ComboFixed => PromotionKind::ComboFixed(serde_json::from_value(config)?),
            PromotionType::PercentCart => PromotionKind::PercentCart(serde_json::from_value(config)?),
            PromotionType::Custom => PromotionKind::Custom,
        };

        Ok(kind)
    }
}

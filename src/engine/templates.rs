// src/engine/templates.rs
//! Built-in promotion template evaluators
//!
//! Every template sinks its discount into the first matching line — a
//! deliberate, reproducible tie-break. The engine measures the realized
//! discount by comparing cart totals before and after.

use crate::{round2, CartLine};

use super::kind::{BuyXGetYConfig, ComboFixedConfig, PercentCartConfig, SecondDiscountConfig};

/// Free `get_qty` units per complete `buy_qty + get_qty` block.
pub fn buy_x_get_y(lines: &mut [CartLine], cfg: &BuyXGetYConfig) {
    let block = cfg.buy_qty + cfg.get_qty;
    if block == 0 {
        return;
    }

    let total_qty: u32 = lines
        .iter()
        .filter(|l| l.product_id == cfg.product_id)
        .map(|l| l.qty)
        .sum();
    let blocks = total_qty / block;
    if blocks < 1 {
        return;
    }

    if let Some(line) = lines.iter_mut().find(|l| l.product_id == cfg.product_id) {
        let discount = round2(f64::from(cfg.get_qty) * line.unit_price * f64::from(blocks));
        line.line_total = (line.line_total - discount).max(0.0);
    }
}

/// Every second unit of a product at a percentage discount.
pub fn second_discount(lines: &mut [CartLine], cfg: &SecondDiscountConfig) {
    let total_qty: u32 = lines
        .iter()
        .filter(|l| l.product_id == cfg.product_id)
        .map(|l| l.qty)
        .sum();
    if total_qty < 2 {
        return;
    }

    let blocks = total_qty / 2;

    if let Some(line) = lines.iter_mut().find(|l| l.product_id == cfg.product_id) {
        let discount = round2(f64::from(blocks) * line.unit_price * cfg.second_percent / 100.0);
        line.line_total = (line.line_total - discount).max(0.0);
    }
}

/// Fixed price for a set of products bought together.
pub fn combo_fixed(lines: &mut [CartLine], cfg: &ComboFixedConfig) {
    let all_present = cfg
        .combo_products
        .iter()
        .all(|p| lines.iter().any(|l| &l.product_id == p));
    if !all_present {
        return;
    }

    let sum: f64 = lines
        .iter()
        .filter(|l| cfg.combo_products.contains(&l.product_id))
        .map(|l| l.line_total)
        .sum();
    if sum <= cfg.combo_price {
        return;
    }

    let discount = round2(sum - cfg.combo_price);

    if let Some(line) = lines
        .iter_mut()
        .find(|l| cfg.combo_products.contains(&l.product_id))
    {
        // Unclamped: a combo price far below a single line's total can
        // legitimately drive that line negative.
        line.line_total -= discount;
    }
}

/// Percentage off the whole cart, sunk into the first line.
pub fn percent_cart(lines: &mut [CartLine], cfg: &PercentCartConfig) {
    let total: f64 = lines.iter().map(|l| l.line_total).sum();
    let discount = round2(total * cfg.percent / 100.0);

    if let Some(line) = lines.first_mut() {
        line.line_total = (line.line_total - discount).max(0.0);
    }
}

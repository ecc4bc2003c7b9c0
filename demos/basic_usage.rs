// demos/basic_usage.rs
//! Basic usage walkthrough for the promotion engine
//!
//! Run with: cargo run --example basic_usage

use promo_rule_engine::{
    CartLine, DiscountEngine, Promotion, PromotionType, StaticCatalog,
};
use serde_json::json;

fn main() {
    tracing_subscriber::fmt().init();

    // A small catalog mixing built-in templates with custom rules.
    let promotions = vec![
        Promotion::new("b2g1-espresso", "Buy 2 espressos, get 1 free", PromotionType::BuyXGetY)
            .with_config(json!({ "productId": "espresso", "buyQty": 2, "getQty": 1 }))
            .with_priority(100)
            .with_stackable(true),
        Promotion::new("big-cart", "10% off carts over 40", PromotionType::Custom)
            .with_dsl(r#"WHEN CART.total > 40 THEN CART.PERCENT 10 LABEL "big cart""#)
            .with_priority(90)
            .with_stackable(true),
        Promotion::new("drinks-bundle", "5 off when drinks exceed 10", PromotionType::Custom)
            .with_logic(
                serde_json::from_value(json!({
                    "when": { "var": "category.Drinks", "op": ">", "value": 10 },
                    "then": { "discountFixedCart": 5 }
                }))
                .expect("valid logic tree"),
            )
            .with_priority(80)
            .with_stackable(true),
    ];

    let mut engine = DiscountEngine::new(StaticCatalog::new(promotions));

    let cart = vec![
        CartLine::new("espresso", "Espresso", 6, 4.5).with_category("Drinks"),
        CartLine::new("burger", "Burger", 2, 12.0).with_category("Food"),
        CartLine::new("fries", "Fries", 2, 4.0).with_category("Food"),
    ];

    println!("=== Cart before promotions ===");
    for line in &cart {
        println!("  {:10} x{} @ {:>6.2} = {:>7.2}", line.product_id, line.qty, line.unit_price, line.line_total);
    }

    let outcome = engine.apply_promotions(&cart, "branch-1", "2025-06-01T12:00:00Z");

    println!("\n=== Applied promotions ===");
    for applied in &outcome.applied_promotions {
        println!("  {:15} {:35} -{:.2}", applied.promo_id, applied.description, applied.discount_amount);
    }

    println!("\n=== Cart after promotions ===");
    for line in &outcome.lines {
        println!("  {:10} x{} = {:>7.2}", line.product_id, line.qty, line.line_total);
    }
    println!("\nTotal discount: {:.2}", outcome.promotion_discount_total);

    // Run the same cart again: the DSL promotion now hits the AST cache.
    engine.apply_promotions(&cart, "branch-1", "2025-06-01T12:00:00Z");
    let stats = engine.cache_stats();
    println!(
        "\nAST cache: {} entries, {} hits, {} compiles",
        stats.size,
        stats.total_hits,
        engine.interpreter().compile_count()
    );
}

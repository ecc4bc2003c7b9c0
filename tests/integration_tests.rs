// tests/integration_tests.rs
//! End-to-end tests for the discount application engine

use promo_rule_engine::{
    CartLine, DiscountEngine, EngineConfig, Promotion, PromotionType, StaticCatalog,
};
use serde_json::json;

const NOW: &str = "2025-06-01T12:00:00Z";
const BRANCH: &str = "branch-1";

fn engine(promotions: Vec<Promotion>) -> DiscountEngine<StaticCatalog> {
    DiscountEngine::new(StaticCatalog::new(promotions))
}

fn percent_cart(id: &str, percent: f64) -> Promotion {
    Promotion::new(id, format!("{percent}% off cart"), PromotionType::PercentCart)
        .with_config(json!({ "percent": percent }))
}

#[test]
fn test_percent_cart_end_to_end() {
    let mut engine = engine(vec![percent_cart("p-10", 10.0)]);
    let cart = vec![CartLine::new("tv", "TV", 1, 1200.0)];

    let outcome = engine.apply_promotions(&cart, BRANCH, NOW);

    assert_eq!(outcome.promotion_discount_total, 120.0);
    assert_eq!(outcome.lines[0].line_total, 1080.0);
    assert_eq!(outcome.applied_promotions.len(), 1);
    assert_eq!(outcome.applied_promotions[0].promo_id, "p-10");
    assert_eq!(outcome.applied_promotions[0].discount_amount, 120.0);
}

#[test]
fn test_caller_lines_are_not_mutated() {
    let mut engine = engine(vec![percent_cart("p-10", 10.0)]);
    let cart = vec![CartLine::new("tv", "TV", 1, 1200.0)];

    let outcome = engine.apply_promotions(&cart, BRANCH, NOW);

    assert_eq!(cart[0].line_total, 1200.0);
    assert_eq!(outcome.lines[0].line_total, 1080.0);
}

#[test]
fn test_buy_x_get_y_block_math_end_to_end() {
    let promo = Promotion::new("b2g1", "Buy 2 get 1 espresso", PromotionType::BuyXGetY)
        .with_config(json!({ "productId": "espresso", "buyQty": 2, "getQty": 1 }));
    let mut engine = engine(vec![promo]);

    let cart = vec![CartLine::new("espresso", "Espresso", 9, 100.0)];
    let outcome = engine.apply_promotions(&cart, BRANCH, NOW);

    // floor(9 / 3) = 3 blocks, 1 free unit each at 100.
    assert_eq!(outcome.promotion_discount_total, 300.0);
    assert_eq!(outcome.lines[0].line_total, 600.0);
}

#[test]
fn test_second_discount_end_to_end() {
    let promo = Promotion::new("2nd-50", "Second latte 50% off", PromotionType::SecondDiscount)
        .with_config(json!({ "productId": "latte", "secondPercent": 50.0 }));
    let mut engine = engine(vec![promo]);

    let cart = vec![CartLine::new("latte", "Latte", 4, 40.0)];
    let outcome = engine.apply_promotions(&cart, BRANCH, NOW);

    // floor(4 / 2) = 2 blocks at 20 each.
    assert_eq!(outcome.promotion_discount_total, 40.0);
    assert_eq!(outcome.lines[0].line_total, 120.0);
}

#[test]
fn test_combo_fixed_negative_line_edge_case() {
    let promo = Promotion::new("combo", "Meal deal", PromotionType::ComboFixed)
        .with_config(json!({ "comboProducts": ["burger", "fries"], "comboPrice": 30.0 }));
    let mut engine = engine(vec![promo]);

    let cart = vec![
        CartLine::new("burger", "Burger", 1, 10.0),
        CartLine::new("fries", "Fries", 1, 90.0),
    ];
    let outcome = engine.apply_promotions(&cart, BRANCH, NOW);

    // 100 combo sum repriced to 30; the full 70 comes off the first combo
    // line, unclamped, driving it negative.
    assert_eq!(outcome.lines[0].line_total, -60.0);
    assert_eq!(outcome.lines[1].line_total, 90.0);
    assert_eq!(outcome.promotion_discount_total, 70.0);
}

#[test]
fn test_combo_fixed_no_discount_when_price_exceeds_sum() {
    let promo = Promotion::new("combo", "Meal deal", PromotionType::ComboFixed)
        .with_config(json!({ "comboProducts": ["burger", "fries"], "comboPrice": 500.0 }));
    let mut engine = engine(vec![promo]);

    let cart = vec![
        CartLine::new("burger", "Burger", 1, 10.0),
        CartLine::new("fries", "Fries", 1, 90.0),
    ];
    let outcome = engine.apply_promotions(&cart, BRANCH, NOW);

    assert!(outcome.applied_promotions.is_empty());
    assert_eq!(outcome.promotion_discount_total, 0.0);
}

#[test]
fn test_stacking_gate_skips_non_stackable_after_any_application() {
    // Stackable A (higher priority) applies first; non-stackable B is then
    // skipped because something has already applied.
    let a = percent_cart("a", 10.0).with_stackable(true).with_priority(100);
    let b = percent_cart("b", 20.0).with_priority(90);

    let mut eng = engine(vec![a, b]);
    let cart = vec![CartLine::new("tv", "TV", 1, 1000.0)];
    let outcome = eng.apply_promotions(&cart, BRANCH, NOW);

    assert_eq!(outcome.applied_promotions.len(), 1);
    assert_eq!(outcome.applied_promotions[0].promo_id, "a");
}

#[test]
fn test_stacking_gate_allows_stackable_after_non_stackable() {
    // Non-stackable B applies first (nothing applied yet); stackable A is
    // not gated and applies on top.
    let b = percent_cart("b", 20.0).with_priority(100);
    let a = percent_cart("a", 10.0).with_stackable(true).with_priority(90);

    let mut eng = engine(vec![a, b]);
    let cart = vec![CartLine::new("tv", "TV", 1, 1000.0)];
    let outcome = eng.apply_promotions(&cart, BRANCH, NOW);

    let ids: Vec<&str> = outcome
        .applied_promotions
        .iter()
        .map(|p| p.promo_id.as_str())
        .collect();
    assert_eq!(ids, vec!["b", "a"]);

    // B takes 200 off 1000, then A takes 10% of the remaining 800.
    assert_eq!(outcome.promotion_discount_total, 280.0);
}

#[test]
fn test_promotion_with_no_discount_does_not_block_stacking() {
    // A non-stackable promotion whose condition fails is not "applied" and
    // must not trip the gate for later non-stackables.
    let dud = Promotion::new("dud", "Never fires", PromotionType::Custom)
        .with_dsl("WHEN CART.total > 999999 THEN CART.PERCENT 50")
        .with_priority(100);
    let b = percent_cart("b", 20.0).with_priority(90);

    let mut eng = engine(vec![dud, b]);
    let cart = vec![CartLine::new("tv", "TV", 1, 1000.0)];
    let outcome = eng.apply_promotions(&cart, BRANCH, NOW);

    assert_eq!(outcome.applied_promotions.len(), 1);
    assert_eq!(outcome.applied_promotions[0].promo_id, "b");
}

#[test]
fn test_exclusion_gate() {
    let a = percent_cart("a", 10.0).with_stackable(true).with_priority(100);
    let b = percent_cart("b", 20.0)
        .with_stackable(true)
        .with_priority(90)
        .with_excludes(vec!["a".to_string()]);

    let mut eng = engine(vec![a, b]);
    let cart = vec![CartLine::new("tv", "TV", 1, 1000.0)];
    let outcome = eng.apply_promotions(&cart, BRANCH, NOW);

    assert_eq!(outcome.applied_promotions.len(), 1);
    assert_eq!(outcome.applied_promotions[0].promo_id, "a");
}

#[test]
fn test_dsl_promotion_end_to_end() {
    let promo = Promotion::new("dsl", "Big cart deal", PromotionType::Custom).with_dsl(
        r#"WHEN CART.total > 500 THEN CART.PERCENT 10 LABEL "big cart"
           AND WHEN CATEGORY("Drinks").amount >= 100 THEN CART.FIXED 5"#,
    );
    let mut eng = engine(vec![promo]);

    let cart = vec![
        CartLine::new("espresso", "Espresso", 2, 60.0).with_category("Drinks"),
        CartLine::new("tv", "TV", 1, 800.0),
    ];
    let outcome = eng.apply_promotions(&cart, BRANCH, NOW);

    // 10% of 920 = 92, then a fixed 5; both sink into the first line.
    assert_eq!(outcome.promotion_discount_total, 97.0);
    assert_eq!(outcome.lines[0].line_total, 23.0);
    assert_eq!(outcome.applied_promotions.len(), 1);
    assert_eq!(outcome.applied_promotions[0].discount_amount, 97.0);
}

#[test]
fn test_logic_promotion_end_to_end() {
    let logic = serde_json::from_value(json!({
        "when": { "all": [
            { "var": "cartTotal", "op": ">=", "value": 100 },
            { "var": "category.Drinks", "op": ">", "value": 0 }
        ]},
        "then": { "discountFixedCart": 15 }
    }))
    .unwrap();

    let promo = Promotion::new("logic", "Drinks bundle", PromotionType::Custom).with_logic(logic);
    let mut eng = engine(vec![promo]);

    let cart = vec![CartLine::new("espresso", "Espresso", 2, 60.0).with_category("Drinks")];
    let outcome = eng.apply_promotions(&cart, BRANCH, NOW);

    assert_eq!(outcome.promotion_discount_total, 15.0);
    assert_eq!(outcome.lines[0].line_total, 105.0);
}

#[test]
fn test_malformed_dsl_is_skipped_silently() {
    let broken = Promotion::new("broken", "Broken DSL", PromotionType::Custom)
        .with_dsl("WHEN CART.total > > THEN ???")
        .with_priority(100);
    let good = percent_cart("good", 10.0).with_priority(90);

    let mut eng = engine(vec![broken, good]);
    let cart = vec![CartLine::new("tv", "TV", 1, 1000.0)];
    let outcome = eng.apply_promotions(&cart, BRANCH, NOW);

    // The broken promotion contributes nothing; the good one still applies.
    assert_eq!(outcome.applied_promotions.len(), 1);
    assert_eq!(outcome.applied_promotions[0].promo_id, "good");
    assert_eq!(eng.cache_stats().size, 0);
}

#[test]
fn test_dsl_cache_hit_on_second_cart() {
    let promo = Promotion::new("dsl", "Big cart deal", PromotionType::Custom)
        .with_dsl("WHEN CART.total > 100 THEN CART.PERCENT 10");
    let mut eng = engine(vec![promo]);
    let cart = vec![CartLine::new("tv", "TV", 1, 1000.0)];

    eng.apply_promotions(&cart, BRANCH, NOW);
    eng.apply_promotions(&cart, BRANCH, NOW);

    assert_eq!(eng.interpreter().compile_count(), 1);

    let stats = eng.cache_stats();
    assert_eq!(stats.size, 1);
    // 1 on insert + 1 lookup hit.
    assert_eq!(stats.total_hits, 2);

    let snapshot = eng.cache_snapshot();
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].hits, 2);
}

#[test]
fn test_cache_clear() {
    let promo = Promotion::new("dsl", "Deal", PromotionType::Custom)
        .with_dsl("WHEN CART.total > 100 THEN CART.PERCENT 10");
    let mut eng = DiscountEngine::with_config(
        StaticCatalog::new(vec![promo]),
        EngineConfig {
            ast_cache_capacity: 8,
        },
    );
    let cart = vec![CartLine::new("tv", "TV", 1, 1000.0)];

    eng.apply_promotions(&cart, BRANCH, NOW);
    assert_eq!(eng.cache_stats().size, 1);

    eng.clear_cache();
    assert_eq!(eng.cache_stats().size, 0);
}

#[test]
fn test_expired_promotion_is_not_applied() {
    let promo = percent_cart("past", 10.0).with_validity("2024-01-01T00:00:00Z", "2024-12-31T23:59:59Z");
    let mut eng = engine(vec![promo]);
    let cart = vec![CartLine::new("tv", "TV", 1, 1000.0)];

    let outcome = eng.apply_promotions(&cart, BRANCH, NOW);
    assert!(outcome.applied_promotions.is_empty());
    assert_eq!(outcome.lines[0].line_total, 1000.0);
}

#[test]
fn test_invalid_template_config_is_skipped() {
    let broken = Promotion::new("broken", "Bad config", PromotionType::PercentCart)
        .with_config(json!({ "percnt": 10 }))
        .with_priority(100);
    let good = percent_cart("good", 10.0).with_priority(90);

    let mut eng = engine(vec![broken, good]);
    let cart = vec![CartLine::new("tv", "TV", 1, 1000.0)];
    let outcome = eng.apply_promotions(&cart, BRANCH, NOW);

    assert_eq!(outcome.applied_promotions.len(), 1);
    assert_eq!(outcome.applied_promotions[0].promo_id, "good");
}

#[test]
fn test_outcome_serialization_shape() {
    let mut eng = engine(vec![percent_cart("p-10", 10.0)]);
    let cart = vec![CartLine::new("tv", "TV", 1, 1200.0)];
    let outcome = eng.apply_promotions(&cart, BRANCH, NOW);

    let json = serde_json::to_value(&outcome).unwrap();
    assert_eq!(json["promotionDiscountTotal"], 120.0);
    assert_eq!(json["appliedPromotions"][0]["promoId"], "p-10");
    assert_eq!(json["lines"][0]["lineTotal"], 1080.0);
}

// src/parser/builder.rs
//! AST builder: lowers the concrete parse tree into the rule AST

use super::ast::{CompareOp, Condition, Rule, RuleAction, RuleSet};
use super::parser::{ActionNode, ConditionNode, ParseError, ParseTree};

/// Build the rule AST from a parse tree.
pub fn build(tree: &ParseTree) -> Result<RuleSet, ParseError> {
    let mut rules = Vec::with_capacity(tree.statements.len());

    for statement in &tree.statements {
        rules.push(Rule {
            condition: build_condition(&statement.condition)?,
            action: build_action(&statement.action),
            label: statement.label.clone(),
        });
    }

    Ok(RuleSet { rules })
}

fn build_condition(node: &ConditionNode) -> Result<Condition, ParseError> {
    match node {
        ConditionNode::Category {
            category,
            metric,
            op,
            value,
        } => Ok(Condition::CategoryMetric {
            category: category.clone(),
            metric: metric.clone(),
            op: comparison(op)?,
            value: *value,
        }),
        ConditionNode::Cart { metric, op, value } => Ok(Condition::CartMetric {
            metric: metric.clone(),
            op: comparison(op)?,
            value: *value,
        }),
    }
}

fn build_action(node: &ActionNode) -> RuleAction {
    match node {
        ActionNode::CartPercent { value } => RuleAction::DiscountPercentCart { percent: *value },
        ActionNode::CartFixed { value } => RuleAction::DiscountFixedCart { amount: *value },
        ActionNode::BuyGet {
            buy_qty,
            product_id,
            get_qty,
        } => RuleAction::BuyXGetY {
            product_id: product_id.clone(),
            buy_qty: *buy_qty,
            get_qty: *get_qty,
        },
    }
}

fn comparison(symbol: &str) -> Result<CompareOp, ParseError> {
    CompareOp::from_symbol(symbol).ok_or_else(|| ParseError {
        message: format!("unknown comparison operator: {}", symbol),
    })
}

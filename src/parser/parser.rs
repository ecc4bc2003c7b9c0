// src/parser/parser.rs
//! Parser that converts a token stream into a concrete parse tree
//!
//! Top-level `AND` separates independent rule statements. On a syntax error
//! the parser records it and resynchronizes at the next `AND` so the whole
//! program is scanned in one pass.

use super::lexer::Token;
use std::fmt;

#[derive(Debug, Clone)]
pub struct ParseError {
    pub message: String,
}

impl ParseError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "parse error: {}", self.message)
    }
}

impl std::error::Error for ParseError {}

/// Concrete parse tree: raw statement nodes before AST building.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseTree {
    pub statements: Vec<StatementNode>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatementNode {
    pub condition: ConditionNode,
    pub action: ActionNode,
    pub label: Option<String>,
}

/// Condition as parsed: operator kept as its source symbol, metric as
/// written. The AST builder maps these to typed forms.
#[derive(Debug, Clone, PartialEq)]
pub enum ConditionNode {
    Category {
        category: String,
        metric: String,
        op: String,
        value: f64,
    },
    Cart {
        metric: String,
        op: String,
        value: f64,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum ActionNode {
    CartPercent { value: f64 },
    CartFixed { value: f64 },
    BuyGet {
        buy_qty: f64,
        product_id: String,
        get_qty: f64,
    },
}

pub struct Parser {
    tokens: Vec<Token>,
    position: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            position: 0,
        }
    }

    pub fn parse(mut self) -> (ParseTree, Vec<ParseError>) {
        let mut statements = Vec::new();
        let mut errors = Vec::new();

        if self.is_at_end() {
            errors.push(ParseError::new("empty rule program"));
        }

        while !self.is_at_end() {
            match self.parse_statement() {
                Ok(statement) => statements.push(statement),
                Err(err) => {
                    errors.push(err);
                    self.synchronize();
                }
            }

            if self.is_at_end() {
                break;
            }

            if self.current() == Some(&Token::And) {
                self.position += 1;
                if self.is_at_end() {
                    errors.push(ParseError::new("trailing AND with no statement"));
                }
            } else {
                errors.push(ParseError::new(format!(
                    "expected AND between statements, got {}",
                    self.describe_current()
                )));
                self.synchronize();
                if self.current() == Some(&Token::And) {
                    self.position += 1;
                }
            }
        }

        (ParseTree { statements }, errors)
    }

    fn parse_statement(&mut self) -> Result<StatementNode, ParseError> {
        self.expect(&Token::When, "WHEN")?;
        let condition = self.parse_condition()?;
        self.expect(&Token::Then, "THEN")?;
        let action = self.parse_action()?;

        let label = if self.current() == Some(&Token::Label) {
            self.position += 1;
            Some(self.expect_string("label value")?)
        } else {
            None
        };

        Ok(StatementNode {
            condition,
            action,
            label,
        })
    }

    fn parse_condition(&mut self) -> Result<ConditionNode, ParseError> {
        match self.current() {
            Some(Token::Category) => {
                self.position += 1;
                self.expect(&Token::LeftParen, "'('")?;
                let category = self.expect_string("category name")?;
                self.expect(&Token::RightParen, "')'")?;
                self.expect(&Token::Dot, "'.'")?;
                let metric = self.expect_ident("metric name")?;
                let op = self.expect_comparison()?;
                let value = self.expect_number("comparison value")?;

                Ok(ConditionNode::Category {
                    category,
                    metric,
                    op,
                    value,
                })
            }
            Some(Token::Cart) => {
                self.position += 1;
                self.expect(&Token::Dot, "'.'")?;
                let metric = self.expect_ident("metric name")?;
                let op = self.expect_comparison()?;
                let value = self.expect_number("comparison value")?;

                Ok(ConditionNode::Cart { metric, op, value })
            }
            _ => Err(ParseError::new(format!(
                "expected CATEGORY or CART condition, got {}",
                self.describe_current()
            ))),
        }
    }

    fn parse_action(&mut self) -> Result<ActionNode, ParseError> {
        match self.current() {
            Some(Token::Cart) => {
                self.position += 1;
                self.expect(&Token::Dot, "'.'")?;

                match self.current() {
                    Some(Token::Percent) => {
                        self.position += 1;
                        let value = self.expect_number("percent value")?;
                        Ok(ActionNode::CartPercent { value })
                    }
                    Some(Token::Fixed) => {
                        self.position += 1;
                        let value = self.expect_number("fixed amount")?;
                        Ok(ActionNode::CartFixed { value })
                    }
                    _ => Err(ParseError::new(format!(
                        "expected PERCENT or FIXED action, got {}",
                        self.describe_current()
                    ))),
                }
            }
            Some(Token::Buy) => {
                self.position += 1;
                let buy_qty = self.expect_number("buy quantity")?;
                self.expect(&Token::Of, "OF")?;
                self.expect(&Token::Product, "PRODUCT")?;
                let product_id = self.expect_ident("product id")?;
                self.expect(&Token::Get, "GET")?;
                let get_qty = self.expect_number("get quantity")?;
                self.expect(&Token::Free, "FREE")?;

                Ok(ActionNode::BuyGet {
                    buy_qty,
                    product_id,
                    get_qty,
                })
            }
            _ => Err(ParseError::new(format!(
                "expected CART or BUY action, got {}",
                self.describe_current()
            ))),
        }
    }

    /// Skip tokens until the next top-level AND (or end of input).
    fn synchronize(&mut self) {
        while !self.is_at_end() && self.current() != Some(&Token::And) {
            self.position += 1;
        }
    }

    fn expect(&mut self, expected: &Token, what: &str) -> Result<(), ParseError> {
        if self.current() == Some(expected) {
            self.position += 1;
            Ok(())
        } else {
            Err(ParseError::new(format!(
                "expected {}, got {}",
                what,
                self.describe_current()
            )))
        }
    }

    fn expect_comparison(&mut self) -> Result<String, ParseError> {
        let symbol = match self.current() {
            Some(Token::Gt) => ">",
            Some(Token::Gte) => ">=",
            Some(Token::Lt) => "<",
            Some(Token::Lte) => "<=",
            Some(Token::EqEq) => "==",
            Some(Token::NotEq) => "!=",
            _ => {
                return Err(ParseError::new(format!(
                    "expected comparison operator, got {}",
                    self.describe_current()
                )))
            }
        };
        self.position += 1;
        Ok(symbol.to_string())
    }

    fn expect_number(&mut self, what: &str) -> Result<f64, ParseError> {
        match self.current() {
            Some(Token::Number(n)) => {
                let value = *n;
                self.position += 1;
                Ok(value)
            }
            _ => Err(ParseError::new(format!(
                "expected {}, got {}",
                what,
                self.describe_current()
            ))),
        }
    }

    fn expect_string(&mut self, what: &str) -> Result<String, ParseError> {
        match self.current() {
            Some(Token::Str(s)) => {
                let value = s.clone();
                self.position += 1;
                Ok(value)
            }
            _ => Err(ParseError::new(format!(
                "expected {}, got {}",
                what,
                self.describe_current()
            ))),
        }
    }

    fn expect_ident(&mut self, what: &str) -> Result<String, ParseError> {
        match self.current() {
            Some(Token::Ident(s)) => {
                let value = s.clone();
                self.position += 1;
                Ok(value)
            }
            _ => Err(ParseError::new(format!(
                "expected {}, got {}",
                what,
                self.describe_current()
            ))),
        }
    }

    fn current(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    fn describe_current(&self) -> String {
        match self.current() {
            Some(token) => token.to_string(),
            None => "end of input".to_string(),
        }
    }

    fn is_at_end(&self) -> bool {
        self.position >= self.tokens.len()
    }
}

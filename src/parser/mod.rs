// src/parser/mod.rs
//! Compiler pipeline for the promotion DSL
//!
//! `compile` runs lexer -> parser -> AST builder and aggregates any errors
//! the first two stages recorded into a single [`CompileError`].

pub mod ast;
pub mod builder;
pub mod lexer;
pub mod parser;

use crate::CompileError;
pub use ast::RuleSet;

/// Compile DSL source into a rule AST.
pub fn compile(source: &str) -> Result<RuleSet, CompileError> {
    let (tokens, lex_errors) = lexer::tokenize(source);
    if !lex_errors.is_empty() {
        return Err(CompileError::Lex(join_messages(
            lex_errors.iter().map(ToString::to_string),
        )));
    }

    let (tree, parse_errors) = parser::Parser::new(tokens).parse();
    if !parse_errors.is_empty() {
        return Err(CompileError::Syntax(join_messages(
            parse_errors.iter().map(|e| e.message.clone()),
        )));
    }

    builder::build(&tree).map_err(|e| CompileError::Syntax(e.message))
}

fn join_messages(messages: impl Iterator<Item = String>) -> String {
    messages.collect::<Vec<_>>().join("; ")
}

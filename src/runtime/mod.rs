// src/runtime/mod.rs
//! Rule evaluation runtime: cart context, structured logic, interpreter

pub mod context;
pub mod interpreter;
pub mod logic;

pub use context::EvalContext;
pub use interpreter::RuleInterpreter;
pub use logic::{LogicError, LogicExpr};

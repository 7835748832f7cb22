//! # reckon-formula
//!
//! Spreadsheet formula engine for the reckon workspace.
//!
//! This crate provides:
//! - Formula lexing and parsing (text → [`Expr`])
//! - Evaluation against live sheet data through the [`Context`] trait
//! - A standard library of 100+ built-in functions
//! - Reference rewriting after structural sheet changes
//!
//! Evaluation is total: every outcome, including parse failures and bad
//! arguments, is a [`Value`] — errors are spreadsheet error values
//! (`#VALUE!`, `#DIV/0!`, ...), never panics or `Err` at the public
//! boundary.
//!
//! ## Example
//!
//! ```rust,ignore
//! use reckon_formula::{Evaluator, Context};
//!
//! let evaluator = Evaluator::new();
//! let result = evaluator.eval(&sheet, "=SUM(A1:A10)/COUNT(A1:A10)");
//! println!("{}", result.text());
//! ```

pub mod ast;
pub mod context;
pub mod criteria;
pub mod evaluator;
pub mod functions;
pub mod lexer;
pub mod parser;
pub mod reference;
pub mod value;

#[cfg(test)]
mod testctx;

pub use ast::{BinaryOp, Expr, UpdateOp, UpdateQuery};
pub use context::{epoch_1900, Context, InvalidReferenceContext};
pub use evaluator::Evaluator;
pub use functions::Registry;
pub use lexer::{tokenize, Lexer, Token, TokenKind};
pub use parser::{parse, ParseError};
pub use reference::Reference;
pub use value::{ErrorValue, Value};

pub use reckon_core::ErrorKind;

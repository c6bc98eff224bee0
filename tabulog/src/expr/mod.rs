//! Expression language for computed columns.
//!
//! This module provides:
//! - `lexer`: Tokenizer with byte positions for error reporting
//! - `parser`: Recursive descent parser producing an [`Expr`]
//! - `ast`: The immutable expression tree
//! - `eval`: Evaluation against a row [`Context`]
//! - `value`: Scalar results (integer, float, string)
//!
//! ## Usage Flow
//!
//! ```text
//! "{stim_time} - {run_start}" → lexer → parser → Expr → eval(row) → Value
//! ```
//!
//! ## Example
//!
//! ```rust
//! use tabulog::expr::{evaluate, parse, EmptyContext, Value};
//!
//! let expr = parse("4*(3+2)").unwrap();
//! assert_eq!(evaluate(&expr, &EmptyContext).unwrap(), Value::Int(20));
//!
//! let expr = parse("a + a").unwrap();
//! assert_eq!(evaluate(&expr, &EmptyContext).unwrap(), Value::Str("aa".into()));
//! ```

pub mod ast;
pub mod eval;
pub mod lexer;
pub mod parser;
pub mod value;

// Re-exports for convenience
pub use ast::{BinaryOp, Expr, Literal};
pub use eval::{evaluate, evaluate_computed, Context, EmptyContext};
pub use lexer::{Lexer, Token};
pub use parser::{parse, Parser};
pub use value::Value;

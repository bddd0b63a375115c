//! # cellflow-expr
//!
//! Expression language for cellflow cells.
//!
//! This crate provides:
//! - Expression parsing (text → AST)
//! - Expression evaluation (AST → value), with variables supplied by a [`Resolver`]
//! - A small set of built-in functions (aggregates, logic, text)
//!
//! ## Example
//!
//! ```rust
//! use cellflow_core::Value;
//! use cellflow_expr::{evaluate, parse_expression, EvaluationContext, ExprResult};
//!
//! let ast = parse_expression("=x1 + x2").unwrap();
//! let vars = |name: &str| -> ExprResult<Value> {
//!     Ok(match name {
//!         "x1" => Value::from(20.0),
//!         _ => Value::from(80.0),
//!     })
//! };
//! let result = evaluate(&ast, &EvaluationContext::new(&vars)).unwrap();
//! assert_eq!(result, Value::from(100.0));
//! ```

pub mod ast;
pub mod error;
pub mod evaluator;
pub mod functions;
pub mod parser;

pub use ast::{BinaryOperator, Expr, UnaryOperator};
pub use error::{ExprError, ExprResult};
pub use evaluator::{evaluate, EvaluationContext, Resolver};
pub use parser::parse_expression;

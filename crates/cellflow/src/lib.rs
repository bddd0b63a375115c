//! # cellflow
//!
//! Lazily evaluated, cacheable, persistable cells for dataflow models.
//!
//! A [`Cell`] stands in for one piece of input or output data inside a
//! shared evaluation environment, a [`Scope`]. Cells are composed into
//! scopes to build computation graphs whose nodes may be constants,
//! expressions, invocable operations, whole sub-workflows, or sets of
//! alternative fidelities.
//!
//! ## Features
//!
//! - Cached evaluation with scope-driven invalidation
//! - Named overrides, scope fragments and fidelity selection per request
//! - Write-through to a durable [`Store`] for persistent cells
//! - Expressions over scope variables via `cellflow-expr`
//!
//! ## Example
//!
//! ```rust
//! use cellflow::prelude::*;
//!
//! let scope = Scope::new().with("x1", 20.0).unwrap().with("x2", 80.0).unwrap();
//! let mut total = Cell::with_source("t", Expression::parse("x1 + x2").unwrap())
//!     .with_scope(scope);
//!
//! assert_eq!(total.evaluate(&[]).unwrap(), Some(Value::Number(100.0)));
//! assert_eq!(
//!     total.evaluate(&[Arg::entry("x1", 0.0)]).unwrap(),
//!     Some(Value::Number(80.0))
//! );
//! ```
//!
//! The engine is single-threaded: cells and scopes are shared through
//! `Rc`/`RefCell` and are neither `Send` nor `Sync`.

pub mod arg;
pub mod cell;
pub mod entry;
pub mod error;
pub mod expression;
pub mod fidelity;
mod guard;
pub mod invoke;
pub mod prelude;
pub mod report;
pub mod scope;
pub mod source;

/// Maximum nesting of source resolution before evaluation gives up
pub const MAX_RESOLUTION_DEPTH: usize = 128;

pub use arg::{select_domain, select_principal, Arg};
pub use cell::{Cell, CellOptions, SharedCell};
pub use entry::{Entry, Setup};
pub use error::{
    ArgError, ContextError, EvalResult, EvaluationError, InvocationError, NotFound, SetterError,
    WorkflowError,
};
pub use expression::Expression;
pub use fidelity::FidelitySet;
pub use invoke::{Incrementor, Invocable, Invoker, SubWorkflow};
pub use report::{Reporter, TracingReporter};
pub use scope::{MergeMode, Scope, ScopeKind};
pub use source::Source;

// Re-export core types
pub use cellflow_core::{Handle, MemoryStore, Store, StoreError, Stored, StoredObject, Value};

//! Error types for the evaluation engine
//!
//! Every failure an evaluation can hit is one of these enums. The only
//! place errors are swallowed is [`Cell::get`](crate::Cell::get), which
//! reports them and hands back `None`.

use cellflow_core::StoreError;
use cellflow_expr::ExprError;
use thiserror::Error;

/// Result type for cell evaluation
pub type EvalResult<T> = std::result::Result<T, EvaluationError>;

/// A cell (or something it depends on) could not produce its value
#[derive(Debug, Error)]
pub enum EvaluationError {
    /// Substitution failed before resolution started
    #[error("Substitution failed: {0}")]
    Setter(#[from] SetterError),

    /// An invoker failed
    #[error("Invocation failed: {0}")]
    Invocation(#[from] InvocationError),

    /// A sub-workflow failed
    #[error("Workflow failed: {0}")]
    Workflow(#[from] WorkflowError),

    /// An expression failed to evaluate
    #[error("Expression failed: {0}")]
    Expression(#[from] ExprError),

    /// The store failed during write-through or read-through
    #[error("Store failed: {0}")]
    Store(#[from] StoreError),

    /// A variable could not be resolved from the scope
    #[error("Argument error: {0}")]
    Arg(#[from] ArgError),

    /// Propagating a scope into a candidate failed
    #[error("Scope error: {0}")]
    Context(#[from] ContextError),

    /// The candidate is already being evaluated further up the stack
    #[error("Circular reference detected involving cell {0}")]
    CircularReference(String),

    /// Nested resolution went deeper than the engine allows
    #[error("Resolution depth exceeded {0}")]
    DepthExceeded(usize),

    /// A persistent cell needs a store but none is attached
    #[error("Cell {0} is persistent but has no store")]
    NoStore(String),
}

/// Applying a value or an argument to a cell failed
#[derive(Debug, Error)]
pub enum SetterError {
    /// Writing into the scope failed
    #[error("Scope mutation failed: {0}")]
    Context(#[from] ContextError),

    /// A fidelity argument named an unknown alternative
    #[error(transparent)]
    Fidelity(#[from] NotFound),

    /// The store rejected a write or update
    #[error("Store failed: {0}")]
    Store(#[from] StoreError),

    /// The source given to `set_value` could not be resolved
    #[error("Failed to resolve the value for cell {cell}")]
    Resolve {
        cell: String,
        #[source]
        source: Box<EvaluationError>,
    },

    /// A persistent cell needs a store but none is attached
    #[error("Cell {0} is persistent but has no store")]
    NoStore(String),
}

/// An invocable failed
#[derive(Debug, Error)]
pub enum InvocationError {
    /// The operation itself reported a failure
    #[error("{0}")]
    Failed(String),

    /// The cell has nothing to invoke
    #[error("Cell {0} has no implementation")]
    NoImplementation(String),

    /// Something the operation evaluated failed
    #[error("Evaluation failed during invocation: {0}")]
    Evaluation(#[source] Box<EvaluationError>),

    /// The operation could not read an argument
    #[error(transparent)]
    Arg(#[from] ArgError),

    /// The operation could not write into its scope
    #[error(transparent)]
    Context(#[from] ContextError),
}

impl From<EvaluationError> for InvocationError {
    fn from(err: EvaluationError) -> Self {
        InvocationError::Evaluation(Box::new(err))
    }
}

/// A sub-workflow failed
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// The workflow reported a failure
    #[error("{0}")]
    Failed(String),

    /// Something the workflow evaluated failed
    #[error("Evaluation failed during workflow: {0}")]
    Evaluation(#[source] Box<EvaluationError>),
}

impl From<EvaluationError> for WorkflowError {
    fn from(err: EvaluationError) -> Self {
        WorkflowError::Evaluation(Box::new(err))
    }
}

/// A variable could not be read from a scope
#[derive(Debug, Error)]
pub enum ArgError {
    /// No entry with that name
    #[error("No variable named {0:?} in scope")]
    Missing(String),

    /// The entry exists but resolved to nothing (an undefined cell)
    #[error("Variable {0:?} has no value")]
    Unbound(String),

    /// The entry resolved to a value of the wrong type
    #[error("Variable {name:?} is a {actual}, expected a {expected}")]
    Invalid {
        name: String,
        expected: &'static str,
        actual: &'static str,
    },

    /// The cell has no scope to read from
    #[error("Cell {0} has no scope")]
    NoScope(String),

    /// Resolving the entry failed
    #[error("Failed to resolve variable {name:?}")]
    Unresolved {
        name: String,
        #[source]
        source: Box<EvaluationError>,
    },
}

/// No fidelity with the requested name
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("No fidelity named {name:?}, available: {available:?}")]
pub struct NotFound {
    pub name: String,
    pub available: Vec<String>,
}

/// A scope could not be read or mutated
#[derive(Debug, Error)]
pub enum ContextError {
    /// The name cannot be used as a scope key
    #[error("Invalid variable name: {0:?}")]
    InvalidName(String),

    /// The scope has been sealed against mutation
    #[error("Scope is sealed, cannot write {0:?}")]
    Sealed(String),

    /// Evaluating the addressed cell failed
    #[error("Evaluation failed: {0}")]
    Evaluation(#[source] Box<EvaluationError>),
}

impl From<EvaluationError> for ContextError {
    fn from(err: EvaluationError) -> Self {
        ContextError::Evaluation(Box::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = NotFound {
            name: "fast".into(),
            available: vec!["exact".into(), "approx".into()],
        };
        assert_eq!(
            err.to_string(),
            "No fidelity named \"fast\", available: [\"exact\", \"approx\"]"
        );

        let err = EvaluationError::from(ArgError::Missing("x1".into()));
        assert_eq!(
            err.to_string(),
            "Argument error: No variable named \"x1\" in scope"
        );
    }

    #[test]
    fn test_setter_error_wraps_fidelity() {
        let err = SetterError::from(NotFound {
            name: "x".into(),
            available: vec![],
        });
        assert!(matches!(err, SetterError::Fidelity(_)));
        assert!(err.to_string().starts_with("No fidelity named"));
    }
}

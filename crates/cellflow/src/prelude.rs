//! Prelude module - common imports for cellflow users
//!
//! ```rust
//! use cellflow::prelude::*;
//! ```

pub use crate::{
    // Arguments
    Arg,
    // Cells
    Cell,
    CellOptions,
    Entry,
    // Error types
    EvalResult,
    EvaluationError,
    Expression,
    FidelitySet,
    Handle,
    Incrementor,
    Invocable,
    InvocationError,
    Invoker,
    MemoryStore,
    MergeMode,
    // Scopes
    Scope,
    ScopeKind,
    SetterError,
    Setup,
    SharedCell,
    Source,
    Store,
    SubWorkflow,
    Value,
    WorkflowError,
};

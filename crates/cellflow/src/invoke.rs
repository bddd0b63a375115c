//! Invocable operations and sub-workflows
//!
//! An [`Invoker`] wraps an [`Invocable`] together with the scope it runs
//! against. The operation itself may be local code or a proxy for a remote
//! service; the engine only sees the trait.

use std::cell::{Cell as StdCell, RefCell};

use cellflow_core::Value;

use crate::arg::Arg;
use crate::error::{InvocationError, WorkflowError};
use crate::scope::Scope;

/// An operation that computes a value from a scope
pub trait Invocable {
    /// Run the operation against `scope`
    fn invoke(&self, scope: &Scope, args: &[Arg]) -> Result<Value, InvocationError>;

    /// Whether the result may differ between calls with the same inputs
    ///
    /// Cells never reuse a cached value produced by a volatile operation.
    fn is_volatile(&self) -> bool {
        false
    }
}

impl<F> Invocable for F
where
    F: Fn(&Scope, &[Arg]) -> Result<Value, InvocationError>,
{
    fn invoke(&self, scope: &Scope, args: &[Arg]) -> Result<Value, InvocationError> {
        self(scope, args)
    }
}

/// A scopable wrapper around an [`Invocable`]
pub struct Invoker {
    name: String,
    op: Box<dyn Invocable>,
    scope: RefCell<Option<Scope>>,
    calls: StdCell<usize>,
}

impl Invoker {
    pub fn new(name: impl Into<String>, op: impl Invocable + 'static) -> Self {
        Self {
            name: name.into(),
            op: Box::new(op),
            scope: RefCell::new(None),
            calls: StdCell::new(0),
        }
    }

    pub fn with_scope(self, scope: Scope) -> Self {
        self.set_scope(scope);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn scope(&self) -> Option<Scope> {
        self.scope.borrow().clone()
    }

    pub fn set_scope(&self, scope: Scope) {
        *self.scope.borrow_mut() = Some(scope);
    }

    pub fn is_volatile(&self) -> bool {
        self.op.is_volatile()
    }

    /// How many times the operation has run
    pub fn calls(&self) -> usize {
        self.calls.get()
    }

    /// Run the operation against `domain`, or the invoker's own scope when
    /// no domain is given
    pub fn invoke(&self, domain: Option<&Scope>, args: &[Arg]) -> Result<Value, InvocationError> {
        self.invoke_with_fallback(domain, None, args)
    }

    /// Like [`Invoker::invoke`], with `fallback` used when the invoker has
    /// no scope of its own
    pub(crate) fn invoke_with_fallback(
        &self,
        domain: Option<&Scope>,
        fallback: Option<&Scope>,
        args: &[Arg],
    ) -> Result<Value, InvocationError> {
        let scope = match domain {
            Some(domain) => domain.clone(),
            None => self
                .scope()
                .or_else(|| fallback.cloned())
                .unwrap_or_default(),
        };

        self.calls.set(self.calls.get() + 1);
        tracing::trace!(invoker = %self.name, variables = scope.size(), "invoking");
        self.op.invoke(&scope, args)
    }
}

/// Adds a fixed step to a scope variable on every call
///
/// The variable starts from zero when absent. Always volatile.
#[derive(Debug, Clone)]
pub struct Incrementor {
    variable: String,
    step: f64,
}

impl Incrementor {
    pub fn new(variable: impl Into<String>, step: f64) -> Self {
        Self {
            variable: variable.into(),
            step,
        }
    }
}

impl Invocable for Incrementor {
    fn invoke(&self, scope: &Scope, _args: &[Arg]) -> Result<Value, InvocationError> {
        let current = if scope.contains(&self.variable) {
            scope.number(&self.variable, &[])?
        } else {
            0.0
        };
        let next = current + self.step;
        scope.put(self.variable.clone(), next)?;
        Ok(Value::Number(next))
    }

    fn is_volatile(&self) -> bool {
        true
    }
}

/// A whole sub-workflow executed as one step
pub trait SubWorkflow {
    fn execute(&self, args: &[Arg]) -> Result<Value, WorkflowError>;

    fn name(&self) -> &str {
        "anonymous"
    }
}

impl<F> SubWorkflow for F
where
    F: Fn(&[Arg]) -> Result<Value, WorkflowError>,
{
    fn execute(&self, args: &[Arg]) -> Result<Value, WorkflowError> {
        self(args)
    }
}

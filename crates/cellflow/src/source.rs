//! The things a cell's value can come from

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use cellflow_core::{Handle, Value};

use crate::arg::{select_domain, Arg};
use crate::cell::{Cell, SharedCell};
use crate::entry::Entry;
use crate::error::{EvalResult, EvaluationError};
use crate::expression::Expression;
use crate::fidelity::FidelitySet;
use crate::guard::{active_name, DepthGuard};
use crate::invoke::{Invoker, SubWorkflow};
use crate::scope::Scope;

/// A value source
///
/// Cells, invokers and expressions are scopable: they carry their own
/// scope, which evaluation may replace or extend.
#[derive(Clone)]
pub enum Source {
    /// Plain data
    Constant(Value),
    /// Formula over scope variables
    Expression(Rc<Expression>),
    /// Invocable operation, possibly remote
    Invoker(Rc<Invoker>),
    /// Whole sub-workflow
    Workflow(Rc<dyn SubWorkflow>),
    /// Alternatives with one selected
    Fidelities(FidelitySet),
    /// Another cell
    Cell(SharedCell),
    /// Named wrapper around an inner source
    Entry(Rc<Entry>),
}

impl Source {
    /// Wrap a sub-workflow
    pub fn workflow(workflow: impl SubWorkflow + 'static) -> Self {
        Source::Workflow(Rc::new(workflow))
    }

    /// Whether the source must be recomputed on every evaluation
    pub fn is_volatile(&self) -> bool {
        match self {
            Source::Invoker(invoker) => invoker.is_volatile(),
            _ => false,
        }
    }

    pub fn is_scopable(&self) -> bool {
        matches!(
            self,
            Source::Cell(_) | Source::Invoker(_) | Source::Expression(_)
        )
    }

    /// The source's own scope
    ///
    /// A cell that is currently being evaluated reports no scope.
    pub fn scope(&self) -> Option<Scope> {
        match self {
            Source::Cell(cell) => cell.try_borrow().ok().and_then(|c| c.scope().cloned()),
            Source::Invoker(invoker) => invoker.scope(),
            Source::Expression(expr) => expr.scope(),
            _ => None,
        }
    }

    /// Replace the source's own scope; a no-op for non-scopable sources
    /// and for cells currently being evaluated
    pub fn set_scope(&self, scope: Scope) {
        match self {
            Source::Cell(cell) => {
                if let Ok(mut cell) = cell.try_borrow_mut() {
                    cell.set_scope(Some(scope));
                }
            }
            Source::Invoker(invoker) => invoker.set_scope(scope),
            Source::Expression(expr) => expr.set_scope(scope),
            _ => {}
        }
    }

    pub fn as_constant(&self) -> Option<&Value> {
        match self {
            Source::Constant(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_handle(&self) -> Option<&Handle> {
        self.as_constant().and_then(Value::as_handle)
    }

    /// A cell with neither a cached value nor an implementation
    pub(crate) fn is_undefined_cell(&self) -> bool {
        match self {
            Source::Cell(cell) => cell.try_borrow().map_or(false, |c| c.is_undefined()),
            _ => false,
        }
    }

    /// Whether this source is the cell stored at `ptr`
    pub(crate) fn is_cell_at(&self, ptr: *const Cell) -> bool {
        match self {
            Source::Cell(cell) => std::ptr::eq(cell.as_ptr() as *const Cell, ptr),
            _ => false,
        }
    }

    /// Produce the source's value
    ///
    /// `enclosing` is the scope the source was found in. Unscoped
    /// expressions and invokers evaluate against it; an unscoped nested
    /// cell adopts it. `Ok(None)` means an undefined cell was reached.
    pub fn resolve(&self, args: &[Arg], enclosing: Option<&Scope>) -> EvalResult<Option<Value>> {
        let _depth = DepthGuard::enter()?;

        match self {
            Source::Constant(value) => Ok(Some(value.clone())),
            Source::Expression(expr) => Ok(Some(expr.evaluate_in(args, enclosing)?)),
            Source::Invoker(invoker) => {
                let value = invoker.invoke_with_fallback(select_domain(args), enclosing, args)?;
                Ok(Some(value))
            }
            Source::Workflow(workflow) => Ok(Some(workflow.execute(args)?)),
            Source::Fidelities(set) => match set.selected() {
                Some(selected) => selected.resolve(args, enclosing),
                None => Ok(None),
            },
            Source::Cell(cell) => {
                let mut cell = cell.try_borrow_mut().map_err(|_| {
                    let name = active_name(cell.as_ptr() as *const Cell)
                        .unwrap_or_else(|| "<unknown>".to_string());
                    EvaluationError::CircularReference(name)
                })?;
                if cell.scope().is_none() {
                    if let Some(enclosing) = enclosing {
                        cell.set_scope(Some(enclosing.clone()));
                    }
                }
                cell.evaluate(args)
            }
            Source::Entry(entry) => entry.source().resolve(args, enclosing),
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Constant(v) => write!(f, "constant {}", v),
            Source::Expression(expr) => write!(f, "expression {}", expr.text()),
            Source::Invoker(invoker) => write!(f, "invoker {}", invoker.name()),
            Source::Workflow(workflow) => write!(f, "workflow {}", workflow.name()),
            Source::Fidelities(set) => write!(f, "fidelities {:?}", set.names()),
            Source::Cell(cell) => match cell.try_borrow() {
                Ok(cell) => write!(f, "cell {}", cell.name()),
                Err(_) => write!(f, "cell <in evaluation>"),
            },
            Source::Entry(entry) => write!(f, "entry {}", entry.name()),
        }
    }
}

impl fmt::Debug for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Source({})", self)
    }
}

impl From<Value> for Source {
    fn from(value: Value) -> Self {
        Source::Constant(value)
    }
}

impl From<f64> for Source {
    fn from(n: f64) -> Self {
        Source::Constant(Value::Number(n))
    }
}

impl From<i32> for Source {
    fn from(n: i32) -> Self {
        Source::Constant(Value::from(n))
    }
}

impl From<bool> for Source {
    fn from(b: bool) -> Self {
        Source::Constant(Value::Boolean(b))
    }
}

impl From<&str> for Source {
    fn from(s: &str) -> Self {
        Source::Constant(Value::string(s))
    }
}

impl From<String> for Source {
    fn from(s: String) -> Self {
        Source::Constant(Value::String(s))
    }
}

impl From<Handle> for Source {
    fn from(handle: Handle) -> Self {
        Source::Constant(Value::Handle(handle))
    }
}

impl From<Expression> for Source {
    fn from(expr: Expression) -> Self {
        Source::Expression(Rc::new(expr))
    }
}

impl From<Invoker> for Source {
    fn from(invoker: Invoker) -> Self {
        Source::Invoker(Rc::new(invoker))
    }
}

impl From<FidelitySet> for Source {
    fn from(set: FidelitySet) -> Self {
        Source::Fidelities(set)
    }
}

impl From<Entry> for Source {
    fn from(entry: Entry) -> Self {
        Source::Entry(Rc::new(entry))
    }
}

impl From<Cell> for Source {
    fn from(cell: Cell) -> Self {
        Source::Cell(Rc::new(RefCell::new(cell)))
    }
}

impl From<SharedCell> for Source {
    fn from(cell: SharedCell) -> Self {
        Source::Cell(cell)
    }
}

impl From<&SharedCell> for Source {
    fn from(cell: &SharedCell) -> Self {
        Source::Cell(Rc::clone(cell))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{InvocationError, WorkflowError};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_constant_resolves_to_itself() {
        let source = Source::from(42.0);
        assert_eq!(source.resolve(&[], None).unwrap(), Some(Value::Number(42.0)));
        assert!(!source.is_scopable());
        assert!(source.scope().is_none());
    }

    #[test]
    fn test_scopable_sources() {
        let expr = Source::from(Expression::parse("a * 2").unwrap());
        assert!(expr.is_scopable());
        assert!(expr.scope().is_none());

        let scope = Scope::new().with("a", 21.0).unwrap();
        expr.set_scope(scope.clone());
        assert!(expr.scope().unwrap().ptr_eq(&scope));
        assert_eq!(expr.resolve(&[], None).unwrap(), Some(Value::Number(42.0)));
    }

    #[test]
    fn test_expression_uses_enclosing_scope() {
        let expr = Source::from(Expression::parse("a + 1").unwrap());
        let scope = Scope::new().with("a", 1.0).unwrap();
        assert_eq!(expr.resolve(&[], Some(&scope)).unwrap(), Some(Value::Number(2.0)));
        assert!(expr.scope().is_none());
    }

    #[test]
    fn test_invoker_and_workflow_dispatch() {
        let invoker = Source::from(Invoker::new(
            "double",
            |scope: &Scope, _args: &[Arg]| -> Result<Value, InvocationError> {
                Ok(Value::Number(scope.number("n", &[])? * 2.0))
            },
        ));
        let domain = Scope::new().with("n", 4.0).unwrap();
        assert_eq!(
            invoker.resolve(&[Arg::scope(domain)], None).unwrap(),
            Some(Value::Number(8.0))
        );

        let workflow = Source::workflow(|args: &[Arg]| -> Result<Value, WorkflowError> {
            Ok(Value::from(args.len() as f64))
        });
        assert_eq!(
            workflow.resolve(&[Arg::fidelity("a")], None).unwrap(),
            Some(Value::Number(1.0))
        );
    }

    #[test]
    fn test_nested_cell_adopts_enclosing_scope() {
        let cell = Cell::new("y").into_shared();
        cell.borrow_mut()
            .set_implementation(Expression::parse("x * 10").unwrap());
        let scope = Scope::new().with("x", 3.0).unwrap();

        let source = Source::from(&cell);
        assert_eq!(source.resolve(&[], Some(&scope)).unwrap(), Some(Value::Number(30.0)));
        assert!(cell.borrow().scope().unwrap().ptr_eq(&scope));
    }

    #[test]
    fn test_undefined_cell_detection() {
        assert!(Source::from(Cell::new("z")).is_undefined_cell());
        assert!(!Source::from(Cell::with_value("z", 1.0)).is_undefined_cell());
        assert!(!Source::from(1.0).is_undefined_cell());
    }

    #[test]
    fn test_display() {
        assert_eq!(Source::from(1.5).to_string(), "constant 1.5");
        assert_eq!(
            Source::from(Expression::parse("=a+b").unwrap()).to_string(),
            "expression =a+b"
        );
        assert_eq!(Source::from(Cell::new("x1")).to_string(), "cell x1");
    }
}

//! Cells and their evaluation protocol
//!
//! A [`Cell`] is a named, lazily evaluated node. Its value comes from one
//! of three places, in order of precedence:
//!
//! 1. the cell's own name bound in its scope, when it has no implementation
//! 2. its implementation, when the cached value is missing or stale
//! 3. the cached value
//!
//! Evaluation applies the request's [`Arg`]s first (substitution), then
//! resolves, caches, and for persistent cells writes the result through to
//! a [`Store`] and keeps only the handle.

use std::cell::RefCell;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use cellflow_core::{Handle, Store, StoreError, Value};

use crate::arg::{select_domain, Arg};
use crate::error::{
    ArgError, ContextError, EvalResult, EvaluationError, InvocationError, NotFound, SetterError,
};
use crate::guard::{ActiveCell, DepthGuard};
use crate::report::{Reporter, TracingReporter};
use crate::scope::{MergeMode, Scope, ScopeKind};
use crate::source::Source;

/// A cell shared between scopes and other cells
pub type SharedCell = Rc<RefCell<Cell>>;

/// Configuration applied to a cell at construction
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CellOptions {
    /// Redirect the value to a store and keep only the handle
    pub persistent: bool,
    /// Store location to write to instead of the store's default
    pub store_location: Option<String>,
    /// Identity of the principal the cell evaluates on behalf of
    pub principal: Option<String>,
}

/// A named, lazily evaluated, cacheable value
///
/// Equality, ordering and hashing use the name only: two cells with the
/// same name are the same cell as far as collections are concerned.
pub struct Cell {
    name: String,
    cached_value: Option<Value>,
    implementation: Option<Source>,
    scope: Option<Scope>,
    valid: bool,
    seen_generation: Option<u64>,
    persistent: bool,
    store: Option<Rc<dyn Store>>,
    store_location: Option<String>,
    principal: Option<String>,
    reporter: Rc<dyn Reporter>,
}

impl Cell {
    /// Create an undefined cell
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cached_value: None,
            implementation: None,
            scope: None,
            valid: false,
            seen_generation: None,
            persistent: false,
            store: None,
            store_location: None,
            principal: None,
            reporter: Rc::new(TracingReporter),
        }
    }

    /// Create a cell holding a value
    pub fn with_value(name: impl Into<String>, value: impl Into<Value>) -> Self {
        let mut cell = Self::new(name);
        cell.cached_value = Some(value.into());
        cell.valid = true;
        cell
    }

    /// Create a cell from any source
    ///
    /// Plain constants are cached; handles and computations become the
    /// implementation.
    pub fn with_source(name: impl Into<String>, source: impl Into<Source>) -> Self {
        match source.into() {
            Source::Constant(value) if !value.is_handle() => Self::with_value(name, value),
            source => {
                let mut cell = Self::new(name);
                cell.implementation = Some(source);
                cell
            }
        }
    }

    pub fn with_options(mut self, options: CellOptions) -> Self {
        self.persistent = options.persistent;
        self.store_location = options.store_location;
        self.principal = options.principal;
        self
    }

    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.set_scope(Some(scope));
        self
    }

    pub fn with_store(mut self, store: Rc<dyn Store>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_store_location(mut self, location: impl Into<String>) -> Self {
        self.store_location = Some(location.into());
        self
    }

    pub fn with_principal(mut self, principal: impl Into<String>) -> Self {
        self.principal = Some(principal.into());
        self
    }

    pub fn with_reporter(mut self, reporter: Rc<dyn Reporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Wrap the cell for sharing between scopes
    pub fn into_shared(self) -> SharedCell {
        Rc::new(RefCell::new(self))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The cached value, without evaluating anything
    pub fn as_is(&self) -> Option<&Value> {
        self.cached_value.as_ref()
    }

    /// The cached value, if `path` addresses this cell
    pub fn as_is_path(&self, path: &str) -> Option<&Value> {
        if self.addresses(path) {
            self.as_is()
        } else {
            None
        }
    }

    pub fn implementation(&self) -> Option<&Source> {
        self.implementation.as_ref()
    }

    /// Install a new implementation and invalidate the cache
    pub fn set_implementation(&mut self, source: impl Into<Source>) {
        self.implementation = Some(source.into());
        self.valid = false;
    }

    pub fn scope(&self) -> Option<&Scope> {
        self.scope.as_ref()
    }

    /// Bind (or unbind) the cell's scope; binding a different scope
    /// invalidates the cache
    pub fn set_scope(&mut self, scope: Option<Scope>) {
        let same = match (&self.scope, &scope) {
            (Some(a), Some(b)) => a.ptr_eq(b),
            (None, None) => true,
            _ => false,
        };
        if !same {
            self.valid = false;
        }
        self.scope = scope;
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Force the next evaluation to recompute
    pub fn invalidate(&mut self) {
        self.valid = false;
    }

    pub fn is_persistent(&self) -> bool {
        self.persistent
    }

    pub fn set_persistent(&mut self, persistent: bool) {
        self.persistent = persistent;
    }

    pub fn store(&self) -> Option<&Rc<dyn Store>> {
        self.store.as_ref()
    }

    pub fn store_location(&self) -> Option<&str> {
        self.store_location.as_deref()
    }

    pub fn principal(&self) -> Option<&str> {
        self.principal.as_deref()
    }

    /// The store handle, for a persistent cell that has one
    pub fn url(&self) -> Option<&Handle> {
        if self.persistent {
            self.implementation.as_ref().and_then(Source::as_handle)
        } else {
            None
        }
    }

    pub fn selected_fidelity(&self) -> Option<&str> {
        match &self.implementation {
            Some(Source::Fidelities(set)) => set.selected_name(),
            _ => None,
        }
    }

    /// Select a fidelity alternative and invalidate the cache
    pub fn select_fidelity(&mut self, name: &str) -> Result<(), NotFound> {
        match &mut self.implementation {
            Some(Source::Fidelities(set)) => {
                set.select(name)?;
                self.valid = false;
                Ok(())
            }
            _ => Err(NotFound {
                name: name.to_string(),
                available: Vec::new(),
            }),
        }
    }

    /// Neither a cached value nor an implementation
    pub fn is_undefined(&self) -> bool {
        self.cached_value.is_none() && self.implementation.is_none()
    }

    // ==================== Substitution ====================

    /// Apply evaluation arguments to the cell
    ///
    /// Arguments are applied in order and the first failure stops the
    /// walk; effects of earlier arguments stay in place.
    pub fn substitute(&mut self, args: &[Arg]) -> Result<(), SetterError> {
        let before = self.scope_generation();
        let mut assigned = false;

        for arg in args {
            match arg {
                Arg::Entry { name, value } if *name == self.name => {
                    self.cached_value = Some(value.clone());
                    self.valid = true;
                    assigned = true;
                }
                Arg::Entry { name, value } => {
                    self.scope
                        .get_or_insert_with(Scope::new)
                        .put(name.clone(), value.clone())?;
                }
                Arg::Fidelity(name) => {
                    if let Some(Source::Fidelities(set)) = &mut self.implementation {
                        set.select(name)?;
                        self.valid = false;
                    }
                }
                Arg::Scope(fragment) => match &self.scope {
                    Some(scope) => scope.merge(fragment, MergeMode::Append)?,
                    None => self.scope = Some(fragment.clone()),
                },
                Arg::Principal(_) => {}
            }
        }

        let after = self.scope_generation();
        if after != before {
            if assigned && self.valid {
                self.seen_generation = after;
            } else {
                self.valid = false;
            }
        }
        Ok(())
    }

    // ==================== Evaluation ====================

    /// Evaluate the cell
    ///
    /// `Ok(None)` means the resolution chain reached an undefined cell (or
    /// the cell itself has nothing to offer); that is reported but is not
    /// an error. Any failure clears the cache and invalidates the cell.
    pub fn evaluate(&mut self, args: &[Arg]) -> EvalResult<Option<Value>> {
        if let Some(value) = self.fast_path() {
            return Ok(Some(value));
        }

        let _depth = DepthGuard::enter()?;
        let _active = ActiveCell::enter(self);

        match self.resolve(args) {
            Ok(value) => Ok(value),
            Err(err) => {
                self.cached_value = None;
                self.valid = false;
                self.reporter.failed(&self.name, &err);
                Err(err)
            }
        }
    }

    /// Valid numeric constant with nothing behind it
    fn fast_path(&self) -> Option<Value> {
        if !self.valid || self.persistent || self.implementation.is_some() {
            return None;
        }
        match &self.cached_value {
            Some(value @ Value::Number(_)) => Some(value.clone()),
            _ => None,
        }
    }

    fn resolve(&mut self, args: &[Arg]) -> EvalResult<Option<Value>> {
        self.refresh();
        self.substitute(args)?;

        if let Some(Source::Fidelities(set)) = &self.implementation {
            let selected = set.selected().cloned();
            return self.resolve_fidelity(selected, args);
        }

        let candidate = match self.candidate() {
            Some(candidate) => candidate,
            None => {
                self.valid = true;
                self.seen_generation = self.scope_generation();
                return Ok(None);
            }
        };

        if candidate.is_undefined_cell() {
            self.reporter.undefined(&self.name, &candidate.to_string());
            return Ok(None);
        }

        if let Some(scope) = self.scope.clone() {
            propagate_scope(&candidate, &scope)?;
        }

        let value = candidate.resolve(args, self.scope.as_ref())?;

        self.cached_value = value.clone();
        self.valid = true;
        self.seen_generation = self.scope_generation();

        if self.persistent {
            return self.write_through(value);
        }
        Ok(value)
    }

    /// Drop the cache's validity if something it depends on moved
    fn refresh(&mut self) {
        let volatile = self
            .implementation
            .as_ref()
            .map_or(false, Source::is_volatile);
        let moved = match &self.scope {
            Some(scope) => scope.changed() || Some(scope.generation()) != self.seen_generation,
            None => false,
        };
        if volatile || moved {
            self.valid = false;
        }
    }

    fn candidate(&self) -> Option<Source> {
        let this = self as *const Cell;
        let bound = match (&self.implementation, &self.scope) {
            (None, Some(scope)) => scope.get(&self.name).filter(|s| !s.is_cell_at(this)),
            _ => None,
        };

        match bound {
            Some(source) => Some(source),
            None if !self.valid || self.cached_value.is_none() => self
                .implementation
                .clone()
                .or_else(|| self.cached_value.clone().map(Source::Constant)),
            None => self.cached_value.clone().map(Source::Constant),
        }
    }

    fn resolve_fidelity(
        &self,
        selected: Option<Source>,
        args: &[Arg],
    ) -> EvalResult<Option<Value>> {
        let value = match selected {
            Some(source) => source.resolve(args, self.scope.as_ref())?,
            None => return Ok(None),
        };

        match (value, &self.scope) {
            (Some(Value::String(name)), Some(scope)) => match scope.get(&name) {
                Some(source) => source.resolve(&[], Some(scope)),
                None => Ok(None),
            },
            (value, _) => Ok(value),
        }
    }

    fn write_through(&mut self, value: Option<Value>) -> EvalResult<Option<Value>> {
        let target = value.or_else(|| {
            self.implementation
                .as_ref()
                .and_then(Source::as_constant)
                .cloned()
        });
        let target = match target {
            Some(target) => target,
            None => return Ok(None),
        };

        let store = self
            .store
            .clone()
            .ok_or_else(|| EvaluationError::NoStore(self.name.clone()))?;

        if store.is_handle(&target) {
            let handle = to_handle(&target)?;
            let stored = store.read(&handle)?;
            tracing::trace!(cell = %self.name, %handle, "read through");
            return Ok(Some(stored.into_value()));
        }

        let handle = match &self.store_location {
            Some(location) => store.write_at(location, &target)?,
            None => store.write(&target)?,
        };
        tracing::debug!(cell = %self.name, %handle, "wrote through to store");

        self.implementation = Some(Source::Constant(Value::Handle(handle)));
        self.cached_value = None;
        Ok(Some(target))
    }

    // ==================== Setting ====================

    /// Replace the cell's value
    ///
    /// A persistent cell forwards the value to its store: a handle becomes
    /// the implementation, anything else updates the object behind the
    /// current handle (or writes a new one for a handle with no object
    /// yet). With no handle installed, nothing happens.
    pub fn set_value(&mut self, source: impl Into<Source>) -> Result<(), SetterError> {
        let source = source.into();

        if self.persistent {
            let value = match source {
                Source::Constant(value) => value,
                // nothing to update until a handle is installed
                _ if self.url().is_none() => return Ok(()),
                other => self.resolve_setter(other)?.unwrap_or_default(),
            };
            return self.store_value(value);
        }

        let value = match source {
            Source::Constant(value) => Some(value),
            other => self.resolve_setter(other)?,
        };

        self.cached_value = value;
        self.valid = true;
        self.seen_generation = self.scope_generation();
        Ok(())
    }

    fn resolve_setter(&self, source: Source) -> Result<Option<Value>, SetterError> {
        source
            .resolve(&[], self.scope.as_ref())
            .map_err(|e| SetterError::Resolve {
                cell: self.name.clone(),
                source: Box::new(e),
            })
    }

    fn store_value(&mut self, value: Value) -> Result<(), SetterError> {
        if self.is_handle(&value) {
            self.implementation = Some(Source::Constant(value));
            self.cached_value = None;
            self.valid = false;
            return Ok(());
        }

        let handle = match self.implementation.as_ref().and_then(Source::as_handle) {
            Some(handle) => handle.clone(),
            None => return Ok(()),
        };
        let store = self
            .store
            .clone()
            .ok_or_else(|| SetterError::NoStore(self.name.clone()))?;

        if handle.is_materialized() {
            store.update(&handle, &value)?;
        } else {
            let handle = store.write_at(&handle.location, &value)?;
            self.implementation = Some(Source::Constant(Value::Handle(handle)));
        }
        self.cached_value = None;
        Ok(())
    }

    fn is_handle(&self, value: &Value) -> bool {
        match &self.store {
            Some(store) => store.is_handle(value),
            None => value.is_handle(),
        }
    }

    // ==================== Other entry points ====================

    /// Evaluate, or invoke when the arguments carry a domain scope;
    /// failures are reported and become `None`
    pub fn get(&mut self, args: &[Arg]) -> Option<Value> {
        let result = if select_domain(args).is_some() {
            self.invoke(args).map_err(EvaluationError::from)
        } else {
            self.evaluate(args)
        };

        match result {
            Ok(value) => value,
            Err(err) => {
                self.reporter.suppressed(&self.name, &err);
                None
            }
        }
    }

    /// Run the implementation directly, bypassing the cache
    pub fn invoke(&self, args: &[Arg]) -> Result<Option<Value>, InvocationError> {
        let source = self
            .implementation
            .clone()
            .ok_or_else(|| InvocationError::NoImplementation(self.name.clone()))?;
        let domain = select_domain(args);

        match &source {
            Source::Invoker(invoker) => Ok(Some(invoker.invoke_with_fallback(
                domain,
                self.scope.as_ref(),
                args,
            )?)),
            other => Ok(other.resolve(args, domain.or(self.scope.as_ref()))?),
        }
    }

    /// Evaluate with the domain scope in `args`, if any, replacing the
    /// cell's scope
    pub fn execute(&mut self, args: &[Arg]) -> EvalResult<Option<Value>> {
        if let Some(domain) = select_domain(args) {
            self.set_scope(Some(domain.clone()));
        }
        self.evaluate(args)
    }

    /// Evaluate the cell if `path` addresses it
    pub fn get_value(&mut self, path: &str, args: &[Arg]) -> Result<Option<Value>, ContextError> {
        if self.addresses(path) {
            Ok(self.evaluate(args)?)
        } else {
            Ok(None)
        }
    }

    /// Cache a value if `path` addresses the cell; returns whether it did
    pub fn put_value(&mut self, path: &str, value: impl Into<Value>) -> bool {
        if !self.addresses(path) {
            return false;
        }
        self.cached_value = Some(value.into());
        self.valid = true;
        self.seen_generation = self.scope_generation();
        true
    }

    /// Copy each cell's cached value into this cell by name
    pub fn add_args<'a>(&mut self, cells: impl IntoIterator<Item = &'a Cell>) {
        for cell in cells {
            if let Some(value) = cell.as_is() {
                self.put_value(cell.name(), value.clone());
            }
        }
    }

    /// Resolve a variable from the cell's scope
    pub fn arg(&self, name: &str) -> Result<Option<Value>, ArgError> {
        let scope = self
            .scope
            .as_ref()
            .ok_or_else(|| ArgError::NoScope(self.name.clone()))?;
        let source = scope
            .get(name)
            .ok_or_else(|| ArgError::Missing(name.to_string()))?;

        source
            .resolve(&[], Some(scope))
            .map_err(|e| ArgError::Unresolved {
                name: name.to_string(),
                source: Box::new(e),
            })
    }

    fn addresses(&self, path: &str) -> bool {
        let mut segments = path.split('/');
        segments.next() == Some(self.name.as_str()) && segments.next().is_none()
    }

    fn scope_generation(&self) -> Option<u64> {
        self.scope.as_ref().map(Scope::generation)
    }
}

/// Hand the cell scope down to the candidate about to be resolved
fn propagate_scope(candidate: &Source, scope: &Scope) -> Result<(), ContextError> {
    if candidate.is_scopable() {
        match candidate.scope() {
            Some(own) if !own.is_empty() => own.merge(scope, MergeMode::Append)?,
            _ => candidate.set_scope(scope.clone()),
        }
    }

    if let Source::Entry(entry) = candidate {
        if let Some(inner) = entry.source().scope() {
            let mode = match scope.kind() {
                ScopeKind::Model => MergeMode::Overwrite,
                ScopeKind::Context => MergeMode::Append,
            };
            inner.merge(scope, mode)?;
        }
    }
    Ok(())
}

fn to_handle(value: &Value) -> Result<Handle, StoreError> {
    match value {
        Value::Handle(handle) => Ok(handle.clone()),
        Value::String(text) => text.parse(),
        other => Err(StoreError::InvalidHandle(other.to_string())),
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cell [name: {}, value: ", self.name)?;
        match &self.cached_value {
            Some(value) => write!(f, "{}", value)?,
            None => write!(f, "none")?,
        }
        write!(f, ", persistent: {}]", self.persistent)
    }
}

impl fmt::Debug for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cell")
            .field("name", &self.name)
            .field("cached_value", &self.cached_value)
            .field("implementation", &self.implementation)
            .field("valid", &self.valid)
            .field("persistent", &self.persistent)
            .finish()
    }
}

impl PartialEq for Cell {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Cell {}

impl PartialOrd for Cell {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Cell {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name.cmp(&other.name)
    }
}

impl Hash for Cell {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (self.name.len() + 1).hash(state);
        self.name.hash(state);
    }
}

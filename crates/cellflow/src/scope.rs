//! Named evaluation environments
//!
//! A [`Scope`] is an insertion-ordered map from names to [`Source`]s,
//! shared by reference between every cell and invoker bound to it. Writes
//! through one handle are visible through all the others.
//!
//! Cells bound into the scope they evaluate against form reference cycles;
//! [`Scope::clear`] breaks them.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use cellflow_core::Value;
use indexmap::IndexMap;

use crate::arg::Arg;
use crate::error::{ArgError, ContextError, EvalResult};
use crate::source::Source;

/// How [`Scope::merge`] combines two scopes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeMode {
    /// Copy every entry of the other scope in, replacing same-named entries
    Append,
    /// Replace the whole contents with the other scope's entries
    Overwrite,
}

/// What a scope represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScopeKind {
    /// Ordinary evaluation context
    #[default]
    Context,
    /// Variability model; entries propagated from it overwrite
    Model,
}

struct ScopeData {
    kind: ScopeKind,
    entries: IndexMap<String, Source>,
    changed: bool,
    sealed: bool,
    generation: u64,
}

/// Shared, mutable, ordered name → source environment
#[derive(Clone)]
pub struct Scope {
    inner: Rc<RefCell<ScopeData>>,
}

impl Scope {
    /// Create an empty context scope
    pub fn new() -> Self {
        Self::with_kind(ScopeKind::Context)
    }

    /// Create an empty model scope
    pub fn model() -> Self {
        Self::with_kind(ScopeKind::Model)
    }

    /// Create an empty scope of the given kind
    pub fn with_kind(kind: ScopeKind) -> Self {
        Self {
            inner: Rc::new(RefCell::new(ScopeData {
                kind,
                entries: IndexMap::new(),
                changed: false,
                sealed: false,
                generation: 0,
            })),
        }
    }

    /// Builder form of [`Scope::put`]
    pub fn with(self, name: impl Into<String>, source: impl Into<Source>) -> Result<Self, ContextError> {
        self.put(name, source)?;
        Ok(self)
    }

    pub fn kind(&self) -> ScopeKind {
        self.inner.borrow().kind
    }

    /// Get the source bound to a name
    pub fn get(&self, name: &str) -> Option<Source> {
        self.inner.borrow().entries.get(name).cloned()
    }

    /// Bind a source to a name, replacing any previous binding
    pub fn put(&self, name: impl Into<String>, source: impl Into<Source>) -> Result<(), ContextError> {
        let name = name.into();
        validate_name(&name)?;

        let mut data = self.inner.borrow_mut();
        if data.sealed {
            return Err(ContextError::Sealed(name));
        }
        data.entries.insert(name, source.into());
        data.generation += 1;
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.inner.borrow().entries.contains_key(name)
    }

    /// Remove a binding, keeping the order of the remaining entries
    pub fn remove(&self, name: &str) -> Option<Source> {
        let mut data = self.inner.borrow_mut();
        let removed = data.entries.shift_remove(name);
        if removed.is_some() {
            data.generation += 1;
        }
        removed
    }

    /// Remove every binding
    pub fn clear(&self) {
        let mut data = self.inner.borrow_mut();
        if !data.entries.is_empty() {
            data.entries.clear();
            data.generation += 1;
        }
    }

    /// Combine another scope into this one
    ///
    /// Merging a scope into itself is a no-op. The merge is not atomic: a
    /// sealed target fails before anything is copied, but nothing else is
    /// rolled back.
    pub fn merge(&self, other: &Scope, mode: MergeMode) -> Result<(), ContextError> {
        if self.ptr_eq(other) {
            return Ok(());
        }

        let incoming: Vec<(String, Source)> = other
            .inner
            .borrow()
            .entries
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        let mut data = self.inner.borrow_mut();
        if data.sealed {
            let name = incoming.first().map(|(k, _)| k.clone()).unwrap_or_default();
            return Err(ContextError::Sealed(name));
        }
        if mode == MergeMode::Overwrite {
            data.entries.clear();
        }
        data.entries.extend(incoming);
        data.generation += 1;
        Ok(())
    }

    /// Whether the scope has been flagged as changed
    pub fn changed(&self) -> bool {
        self.inner.borrow().changed
    }

    /// Flag (or clear) the scope as changed; every bound cell recomputes
    /// while the flag is set
    pub fn set_changed(&self, changed: bool) {
        self.inner.borrow_mut().changed = changed;
    }

    /// Counter bumped by every mutation
    pub fn generation(&self) -> u64 {
        self.inner.borrow().generation
    }

    /// Refuse all further mutation
    pub fn seal(&self) {
        self.inner.borrow_mut().sealed = true;
    }

    pub fn size(&self) -> usize {
        self.inner.borrow().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.borrow().entries.is_empty()
    }

    /// Names in insertion order
    pub fn names(&self) -> Vec<String> {
        self.inner.borrow().entries.keys().cloned().collect()
    }

    /// Check whether two handles share the same scope
    pub fn ptr_eq(&self, other: &Scope) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// The raw constant bound to a name, without evaluating anything
    pub fn as_is(&self, name: &str) -> Option<Value> {
        match self.get(name)? {
            Source::Constant(v) => Some(v),
            _ => None,
        }
    }

    /// Resolve the value bound to a name
    ///
    /// Unscoped expressions and invokers found here are evaluated against
    /// this scope.
    pub fn value(&self, name: &str, args: &[Arg]) -> EvalResult<Value> {
        let source = self
            .get(name)
            .ok_or_else(|| ArgError::Missing(name.to_string()))?;
        match source.resolve(args, Some(self))? {
            Some(value) => Ok(value),
            None => Err(ArgError::Unbound(name.to_string()).into()),
        }
    }

    /// Resolve a name to a number
    pub fn number(&self, name: &str, args: &[Arg]) -> EvalResult<f64> {
        let value = self.value(name, args)?;
        value.as_number().ok_or_else(|| {
            ArgError::Invalid {
                name: name.to_string(),
                expected: "number",
                actual: value.type_name(),
            }
            .into()
        })
    }
}

impl Default for Scope {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Entries may hold cells bound to this very scope, so only names are shown.
        let data = self.inner.borrow();
        f.debug_struct("Scope")
            .field("kind", &data.kind)
            .field("names", &data.entries.keys().collect::<Vec<_>>())
            .field("generation", &data.generation)
            .finish()
    }
}

fn validate_name(name: &str) -> Result<(), ContextError> {
    if name.is_empty() || name.contains('/') {
        return Err(ContextError::InvalidName(name.to_string()));
    }
    Ok(())
}

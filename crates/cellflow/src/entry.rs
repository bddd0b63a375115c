//! Named entries and setups

use std::cell::Cell as StdCell;

use cellflow_core::Value;

use crate::arg::Arg;
use crate::error::{ContextError, EvalResult};
use crate::scope::Scope;
use crate::source::Source;

/// A named wrapper around an inner source
///
/// When a cell propagates its scope into an entry, the inner source's scope
/// is overwritten by model scopes and appended to by everything else.
#[derive(Debug, Clone)]
pub struct Entry {
    name: String,
    path: String,
    source: Source,
}

impl Entry {
    pub fn new(name: impl Into<String>, source: impl Into<Source>) -> Self {
        let name = name.into();
        Self {
            path: name.clone(),
            name,
            source: source.into(),
        }
    }

    /// Set the path the entry is addressed by (defaults to its name)
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn source(&self) -> &Source {
        &self.source
    }

    /// Evaluate the inner source
    pub fn resolve(&self, args: &[Arg]) -> EvalResult<Option<Value>> {
        self.source.resolve(args, None)
    }
}

/// A named entry wrapping a scope of configuration values
///
/// Writing through the setup marks it invalid so whoever consumes it knows
/// to re-read.
#[derive(Debug)]
pub struct Setup {
    name: String,
    scope: Scope,
    valid: StdCell<bool>,
}

impl Setup {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_scope(name, Scope::new())
    }

    pub fn with_scope(name: impl Into<String>, scope: Scope) -> Self {
        Self {
            name: name.into(),
            scope,
            valid: StdCell::new(true),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Write a value into the wrapped scope and invalidate the setup
    pub fn set_value(&self, path: &str, value: impl Into<Source>) -> Result<(), ContextError> {
        self.scope.put(path, value)?;
        self.valid.set(false);
        Ok(())
    }

    /// Read a value from the wrapped scope
    pub fn context_value(&self, path: &str, args: &[Arg]) -> EvalResult<Value> {
        self.scope.value(path, args)
    }

    pub fn is_valid(&self) -> bool {
        self.valid.get()
    }

    pub fn set_valid(&self, valid: bool) {
        self.valid.set(valid);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::Expression;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_entry_resolves_inner_source() {
        let entry = Entry::new("total", 7.0).with_path("model/total");
        assert_eq!(entry.name(), "total");
        assert_eq!(entry.path(), "model/total");
        assert_eq!(entry.resolve(&[]).unwrap(), Some(Value::Number(7.0)));
    }

    #[test]
    fn test_entry_with_scoped_expression() {
        let scope = Scope::new().with("a", 4.0).unwrap();
        let entry = Entry::new("sq", Expression::parse("a * a").unwrap().with_scope(scope));
        assert_eq!(entry.resolve(&[]).unwrap(), Some(Value::Number(16.0)));
    }

    #[test]
    fn test_setup_set_value_invalidates() {
        let setup = Setup::new("config");
        assert!(setup.is_valid());

        setup.set_value("threshold", 0.5).unwrap();
        assert!(!setup.is_valid());
        assert_eq!(setup.context_value("threshold", &[]).unwrap(), Value::Number(0.5));

        setup.set_valid(true);
        assert!(setup.is_valid());
    }

    #[test]
    fn test_setup_rejects_bad_path() {
        let setup = Setup::new("config");
        assert!(setup.set_value("a/b", 1.0).is_err());
        assert!(setup.is_valid());
        assert!(setup.context_value("a", &[]).is_err());
    }
}

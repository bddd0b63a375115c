//! Typed evaluation arguments

use cellflow_core::Value;

use crate::scope::Scope;

/// An argument passed to an evaluation request
///
/// Substitution applies these in order before a cell resolves. Invokers
/// and workflows receive the full list and may read any kind, including
/// ones substitution ignores.
#[derive(Debug, Clone)]
pub enum Arg {
    /// Named override: replaces the cell's own value, or a scope variable
    Entry { name: String, value: Value },
    /// Select the named fidelity alternative
    Fidelity(String),
    /// Scope fragment merged into the cell scope; also the invocation domain
    Scope(Scope),
    /// Identity of the caller, never authenticated
    Principal(String),
}

impl Arg {
    pub fn entry(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Arg::Entry {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn fidelity(name: impl Into<String>) -> Self {
        Arg::Fidelity(name.into())
    }

    pub fn scope(scope: Scope) -> Self {
        Arg::Scope(scope)
    }

    pub fn principal(name: impl Into<String>) -> Self {
        Arg::Principal(name.into())
    }
}

/// The first scope fragment in the arguments, used as the invocation domain
pub fn select_domain(args: &[Arg]) -> Option<&Scope> {
    args.iter().find_map(|arg| match arg {
        Arg::Scope(scope) => Some(scope),
        _ => None,
    })
}

/// The first principal in the arguments
pub fn select_principal(args: &[Arg]) -> Option<&str> {
    args.iter().find_map(|arg| match arg {
        Arg::Principal(name) => Some(name.as_str()),
        _ => None,
    })
}

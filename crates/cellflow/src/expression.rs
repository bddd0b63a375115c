//! Expression sources
//!
//! Wraps a parsed `cellflow-expr` formula so it can sit in a cell's
//! implementation slot or in a scope. Names in the formula resolve first
//! against named overrides in the evaluation arguments, then against the
//! expression's scope.

use std::cell::RefCell;
use std::collections::BTreeSet;

use cellflow_core::Value;
use cellflow_expr::{parse_expression, EvaluationContext, Expr, ExprError, ExprResult};

use crate::arg::Arg;
use crate::error::{EvalResult, EvaluationError};
use crate::scope::Scope;

/// A parsed formula with an optional scope
pub struct Expression {
    text: String,
    ast: Expr,
    scope: RefCell<Option<Scope>>,
}

impl Expression {
    /// Parse formula text (a leading `=` is optional)
    pub fn parse(text: &str) -> ExprResult<Self> {
        Ok(Self {
            text: text.to_string(),
            ast: parse_expression(text)?,
            scope: RefCell::new(None),
        })
    }

    pub fn with_scope(self, scope: Scope) -> Self {
        self.set_scope(scope);
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn ast(&self) -> &Expr {
        &self.ast
    }

    /// Variable names the formula reads
    pub fn names(&self) -> BTreeSet<String> {
        self.ast.names()
    }

    pub fn scope(&self) -> Option<Scope> {
        self.scope.borrow().clone()
    }

    pub fn set_scope(&self, scope: Scope) {
        *self.scope.borrow_mut() = Some(scope);
    }

    /// Evaluate against the expression's own scope
    pub fn evaluate(&self, args: &[Arg]) -> EvalResult<Value> {
        self.evaluate_in(args, None)
    }

    pub(crate) fn evaluate_in(&self, args: &[Arg], enclosing: Option<&Scope>) -> EvalResult<Value> {
        let scope = self.scope().or_else(|| enclosing.cloned());

        let resolver = |name: &str| -> ExprResult<Value> {
            let overridden = args.iter().find_map(|arg| match arg {
                Arg::Entry { name: n, value } if n == name => Some(value.clone()),
                _ => None,
            });
            if let Some(value) = overridden {
                return Ok(value);
            }

            match &scope {
                Some(scope) => scope.value(name, &[]).map_err(|e| ExprError::Resolve {
                    name: name.to_string(),
                    source: Box::new(e),
                }),
                None => Err(ExprError::UndefinedName(name.to_string())),
            }
        };

        cellflow_expr::evaluate(&self.ast, &EvaluationContext::new(&resolver)).map_err(unwrap_resolve)
    }
}

/// Surface an engine error raised while resolving a name as itself rather
/// than as an expression failure
fn unwrap_resolve(err: ExprError) -> EvaluationError {
    match err {
        ExprError::Resolve { name, source } => match source.downcast::<EvaluationError>() {
            Ok(inner) => *inner,
            Err(source) => EvaluationError::Expression(ExprError::Resolve { name, source }),
        },
        other => EvaluationError::Expression(other),
    }
}

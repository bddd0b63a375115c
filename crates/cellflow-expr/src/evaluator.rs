//! Expression evaluator
//!
//! Evaluates expression ASTs to produce values. Variables are looked up
//! through a [`Resolver`] supplied by the caller.

use crate::ast::{BinaryOperator, Expr, UnaryOperator};
use crate::error::{ExprError, ExprResult};
use crate::functions::FunctionRegistry;
use cellflow_core::Value;
use std::cmp::Ordering;
use std::sync::OnceLock;

/// Global function registry (lazily initialized)
static FUNCTION_REGISTRY: OnceLock<FunctionRegistry> = OnceLock::new();

fn get_function_registry() -> &'static FunctionRegistry {
    FUNCTION_REGISTRY.get_or_init(FunctionRegistry::new)
}

/// Source of variable values during evaluation
pub trait Resolver {
    /// Produce the value bound to `name`
    fn resolve(&self, name: &str) -> ExprResult<Value>;
}

impl<F> Resolver for F
where
    F: Fn(&str) -> ExprResult<Value>,
{
    fn resolve(&self, name: &str) -> ExprResult<Value> {
        self(name)
    }
}

/// Context for expression evaluation
pub struct EvaluationContext<'a> {
    /// Variable lookup, if any
    pub resolver: Option<&'a dyn Resolver>,
}

impl<'a> EvaluationContext<'a> {
    /// Create a new evaluation context
    pub fn new(resolver: &'a dyn Resolver) -> Self {
        Self {
            resolver: Some(resolver),
        }
    }

    /// Create a context with no variables (for constant expressions)
    pub fn simple() -> Self {
        Self { resolver: None }
    }

    /// Look up a variable
    pub fn resolve(&self, name: &str) -> ExprResult<Value> {
        match self.resolver {
            Some(resolver) => resolver.resolve(name),
            None => Err(ExprError::UndefinedName(name.to_string())),
        }
    }
}

/// Evaluate an expression
pub fn evaluate(expr: &Expr, ctx: &EvaluationContext) -> ExprResult<Value> {
    match expr {
        // === Literals ===
        Expr::Number(n) => Ok(Value::Number(*n)),
        Expr::String(s) => Ok(Value::String(s.clone())),
        Expr::Boolean(b) => Ok(Value::Boolean(*b)),

        // === References ===
        Expr::Name(name) => ctx.resolve(name),

        // === Operators ===
        Expr::BinaryOp { op, left, right } => evaluate_binary_op(*op, left, right, ctx),
        Expr::UnaryOp { op, operand } => evaluate_unary_op(*op, operand, ctx),

        // === Functions ===
        Expr::Function { name, args } => evaluate_function(name, args, ctx),

        // === Lists ===
        Expr::List(items) => {
            let mut values = Vec::with_capacity(items.len());
            for item in items {
                values.push(evaluate(item, ctx)?);
            }
            Ok(Value::List(values))
        }
    }
}

/// Coerce a value to a number for arithmetic
///
/// Empty counts as zero; strings are parsed.
pub fn to_number(value: &Value) -> ExprResult<f64> {
    match value {
        Value::Empty => Ok(0.0),
        Value::String(s) => s
            .trim()
            .parse()
            .map_err(|_| ExprError::Evaluation(format!("Cannot convert {:?} to number", s))),
        v => v.as_number().ok_or_else(|| {
            ExprError::Evaluation(format!("Cannot convert {} to number", v.type_name()))
        }),
    }
}

/// Render a value as text for concatenation
pub fn to_text(value: &Value) -> String {
    match value {
        Value::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
        Value::Boolean(true) => "TRUE".to_string(),
        Value::Boolean(false) => "FALSE".to_string(),
        v => v.to_string(),
    }
}

/// Evaluate a binary operation
fn evaluate_binary_op(
    op: BinaryOperator,
    left: &Expr,
    right: &Expr,
    ctx: &EvaluationContext,
) -> ExprResult<Value> {
    let left_val = evaluate(left, ctx)?;
    let right_val = evaluate(right, ctx)?;

    match op {
        // Arithmetic operators
        BinaryOperator::Add => Ok(Value::Number(
            to_number(&left_val)? + to_number(&right_val)?,
        )),
        BinaryOperator::Subtract => Ok(Value::Number(
            to_number(&left_val)? - to_number(&right_val)?,
        )),
        BinaryOperator::Multiply => Ok(Value::Number(
            to_number(&left_val)? * to_number(&right_val)?,
        )),
        BinaryOperator::Divide => {
            let l = to_number(&left_val)?;
            let r = to_number(&right_val)?;
            if r == 0.0 {
                Err(ExprError::Evaluation("Division by zero".into()))
            } else {
                Ok(Value::Number(l / r))
            }
        }
        BinaryOperator::Power => {
            let result = to_number(&left_val)?.powf(to_number(&right_val)?);
            if result.is_nan() || result.is_infinite() {
                Err(ExprError::Evaluation("Power result is not a finite number".into()))
            } else {
                Ok(Value::Number(result))
            }
        }

        // Comparison operators
        BinaryOperator::Equal => Ok(Value::Boolean(
            compare_values(&left_val, &right_val) == Ordering::Equal,
        )),
        BinaryOperator::NotEqual => Ok(Value::Boolean(
            compare_values(&left_val, &right_val) != Ordering::Equal,
        )),
        BinaryOperator::LessThan => Ok(Value::Boolean(
            compare_values(&left_val, &right_val) == Ordering::Less,
        )),
        BinaryOperator::LessEqual => Ok(Value::Boolean(
            compare_values(&left_val, &right_val) != Ordering::Greater,
        )),
        BinaryOperator::GreaterThan => Ok(Value::Boolean(
            compare_values(&left_val, &right_val) == Ordering::Greater,
        )),
        BinaryOperator::GreaterEqual => Ok(Value::Boolean(
            compare_values(&left_val, &right_val) != Ordering::Less,
        )),

        // Concatenation
        BinaryOperator::Concat => Ok(Value::String(to_text(&left_val) + &to_text(&right_val))),
    }
}

/// Compare two values for ordering
///
/// Mixed types order as number < string < boolean; empty compares as zero.
fn compare_values(left: &Value, right: &Value) -> Ordering {
    let left = match left {
        Value::Empty => &Value::Number(0.0),
        v => v,
    };
    let right = match right {
        Value::Empty => &Value::Number(0.0),
        v => v,
    };

    fn rank(v: &Value) -> u8 {
        match v {
            Value::Number(_) => 0,
            Value::String(_) => 1,
            Value::Boolean(_) => 2,
            _ => 3,
        }
    }

    match (left, right) {
        (Value::Number(l), Value::Number(r)) => l.partial_cmp(r).unwrap_or(Ordering::Equal),
        // Strings compare case-insensitively
        (Value::String(l), Value::String(r)) => l.to_lowercase().cmp(&r.to_lowercase()),
        (Value::Boolean(l), Value::Boolean(r)) => l.cmp(r),
        (l, r) if rank(l) != rank(r) => rank(l).cmp(&rank(r)),
        (l, r) => {
            if l == r {
                Ordering::Equal
            } else {
                to_text(l).cmp(&to_text(r))
            }
        }
    }
}

/// Evaluate a unary operation
fn evaluate_unary_op(op: UnaryOperator, operand: &Expr, ctx: &EvaluationContext) -> ExprResult<Value> {
    let n = to_number(&evaluate(operand, ctx)?)?;

    match op {
        UnaryOperator::Negate => Ok(Value::Number(-n)),
        UnaryOperator::Percent => Ok(Value::Number(n / 100.0)),
    }
}

/// Evaluate a function call
fn evaluate_function(name: &str, args: &[Expr], ctx: &EvaluationContext) -> ExprResult<Value> {
    let registry = get_function_registry();

    let func = registry
        .get(name)
        .ok_or_else(|| ExprError::UnknownFunction(name.to_string()))?;

    if args.len() < func.min_args {
        return Err(ExprError::ArgumentCount {
            function: name.to_string(),
            expected: format!("at least {}", func.min_args),
            actual: args.len(),
        });
    }

    if let Some(max) = func.max_args {
        if args.len() > max {
            return Err(ExprError::ArgumentCount {
                function: name.to_string(),
                expected: format!("at most {}", max),
                actual: args.len(),
            });
        }
    }

    let mut evaluated_args = Vec::with_capacity(args.len());
    for arg in args {
        evaluated_args.push(evaluate(arg, ctx)?);
    }

    (func.implementation)(&evaluated_args, ctx)
}

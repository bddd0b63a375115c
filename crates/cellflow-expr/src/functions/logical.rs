//! Logical functions

use crate::error::{ExprError, ExprResult};
use crate::evaluator::EvaluationContext;
use cellflow_core::Value;

fn truthy(value: &Value) -> ExprResult<bool> {
    match value {
        Value::Empty => Ok(false),
        Value::String(s) if s.eq_ignore_ascii_case("true") => Ok(true),
        Value::String(s) if s.eq_ignore_ascii_case("false") => Ok(false),
        v => v.as_bool().ok_or_else(|| {
            ExprError::Argument(format!("Expected a logical value, got {}", v.type_name()))
        }),
    }
}

fn collect_bools(args: &[Value], out: &mut Vec<bool>) -> ExprResult<()> {
    for arg in args {
        match arg {
            Value::List(items) => collect_bools(items, out)?,
            v => out.push(truthy(v)?),
        }
    }
    Ok(())
}

/// IF function
pub fn fn_if(args: &[Value], _ctx: &EvaluationContext) -> ExprResult<Value> {
    if truthy(&args[0])? {
        Ok(args[1].clone())
    } else {
        Ok(args.get(2).cloned().unwrap_or(Value::Boolean(false)))
    }
}

/// AND function
pub fn fn_and(args: &[Value], _ctx: &EvaluationContext) -> ExprResult<Value> {
    let mut bools = Vec::new();
    collect_bools(args, &mut bools)?;
    Ok(Value::Boolean(bools.iter().all(|b| *b)))
}

/// OR function
pub fn fn_or(args: &[Value], _ctx: &EvaluationContext) -> ExprResult<Value> {
    let mut bools = Vec::new();
    collect_bools(args, &mut bools)?;
    Ok(Value::Boolean(bools.iter().any(|b| *b)))
}

/// NOT function
pub fn fn_not(args: &[Value], _ctx: &EvaluationContext) -> ExprResult<Value> {
    Ok(Value::Boolean(!truthy(&args[0])?))
}

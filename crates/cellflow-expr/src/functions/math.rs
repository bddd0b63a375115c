//! Math functions

use super::for_each_number;
use crate::error::{ExprError, ExprResult};
use crate::evaluator::{to_number, EvaluationContext};
use cellflow_core::Value;

/// SUM function
pub fn fn_sum(args: &[Value], _ctx: &EvaluationContext) -> ExprResult<Value> {
    let mut sum = 0.0;
    for_each_number(args, &mut |n| sum += n);
    Ok(Value::Number(sum))
}

/// AVERAGE function
pub fn fn_average(args: &[Value], _ctx: &EvaluationContext) -> ExprResult<Value> {
    let mut sum = 0.0;
    let mut count = 0;
    for_each_number(args, &mut |n| {
        sum += n;
        count += 1;
    });

    if count == 0 {
        Err(ExprError::Evaluation("AVERAGE of no numbers".into()))
    } else {
        Ok(Value::Number(sum / count as f64))
    }
}

/// MIN function
pub fn fn_min(args: &[Value], _ctx: &EvaluationContext) -> ExprResult<Value> {
    let mut min: Option<f64> = None;
    for_each_number(args, &mut |n| min = Some(min.map_or(n, |m| m.min(n))));
    Ok(Value::Number(min.unwrap_or(0.0)))
}

/// MAX function
pub fn fn_max(args: &[Value], _ctx: &EvaluationContext) -> ExprResult<Value> {
    let mut max: Option<f64> = None;
    for_each_number(args, &mut |n| max = Some(max.map_or(n, |m| m.max(n))));
    Ok(Value::Number(max.unwrap_or(0.0)))
}

/// COUNT function - counts numeric values
pub fn fn_count(args: &[Value], _ctx: &EvaluationContext) -> ExprResult<Value> {
    let mut count = 0;
    for_each_number(args, &mut |_| count += 1);
    Ok(Value::Number(count as f64))
}

/// ABS function
pub fn fn_abs(args: &[Value], _ctx: &EvaluationContext) -> ExprResult<Value> {
    Ok(Value::Number(to_number(&args[0])?.abs()))
}

/// ROUND function - rounds half away from zero
pub fn fn_round(args: &[Value], _ctx: &EvaluationContext) -> ExprResult<Value> {
    let n = to_number(&args[0])?;
    let digits = match args.get(1) {
        Some(d) => to_number(d)?.trunc() as i32,
        None => 0,
    };

    let factor = 10f64.powi(digits);
    Ok(Value::Number((n * factor).round() / factor))
}

/// SQRT function
pub fn fn_sqrt(args: &[Value], _ctx: &EvaluationContext) -> ExprResult<Value> {
    let n = to_number(&args[0])?;
    if n < 0.0 {
        return Err(ExprError::Argument("SQRT of a negative number".into()));
    }
    Ok(Value::Number(n.sqrt()))
}

/// POWER function
pub fn fn_power(args: &[Value], _ctx: &EvaluationContext) -> ExprResult<Value> {
    let result = to_number(&args[0])?.powf(to_number(&args[1])?);
    if result.is_finite() {
        Ok(Value::Number(result))
    } else {
        Err(ExprError::Evaluation("POWER result is not a finite number".into()))
    }
}

//! Text functions

use crate::error::{ExprError, ExprResult};
use crate::evaluator::{to_text, EvaluationContext};
use cellflow_core::Value;

/// CONCAT function - joins all arguments, flattening lists
pub fn fn_concat(args: &[Value], _ctx: &EvaluationContext) -> ExprResult<Value> {
    fn push(out: &mut String, args: &[Value]) {
        for arg in args {
            match arg {
                Value::List(items) => push(out, items),
                v => out.push_str(&to_text(v)),
            }
        }
    }

    let mut out = String::new();
    push(&mut out, args);
    Ok(Value::String(out))
}

/// LEN function - length in characters
pub fn fn_len(args: &[Value], _ctx: &EvaluationContext) -> ExprResult<Value> {
    match &args[0] {
        Value::List(_) => Err(ExprError::Argument("LEN expects a scalar".into())),
        v => Ok(Value::Number(to_text(v).chars().count() as f64)),
    }
}

/// UPPER function
pub fn fn_upper(args: &[Value], _ctx: &EvaluationContext) -> ExprResult<Value> {
    Ok(Value::String(to_text(&args[0]).to_uppercase()))
}

/// LOWER function
pub fn fn_lower(args: &[Value], _ctx: &EvaluationContext) -> ExprResult<Value> {
    Ok(Value::String(to_text(&args[0]).to_lowercase()))
}

#[cfg(test)]
mod tests {
    use crate::{evaluate, parse_expression, EvaluationContext};
    use cellflow_core::Value;
    use pretty_assertions::assert_eq;

    fn eval(text: &str) -> Value {
        let ast = parse_expression(text).unwrap();
        evaluate(&ast, &EvaluationContext::simple()).unwrap()
    }

    #[test]
    fn test_text_functions() {
        assert_eq!(eval("CONCAT(\"a\", 1, {2, \"b\"})"), Value::string("a12b"));
        assert_eq!(eval("LEN(\"héllo\")"), Value::Number(5.0));
        assert_eq!(eval("UPPER(\"abc\")"), Value::string("ABC"));
        assert_eq!(eval("LOWER(\"AbC\")"), Value::string("abc"));
    }
}

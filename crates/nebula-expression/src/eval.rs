//! Evaluate a parsed [`Expr`] against a scope (§4.2).

use serde_json::Value;

use crate::ast::{BinOp, Expr};
use crate::error::{ExpressionError, Result};
use crate::path::get_nested;

/// Evaluate `expr` against `scope` (typically the node's assembled
/// `input`). Paths (`$json.x`, bare identifiers) are resolved via
/// [`get_nested`]; `pi` and `e` are recognised as constants when they
/// do not resolve to anything in scope.
pub fn eval(expr: &Expr, scope: &Value) -> Result<Value> {
    match expr {
        Expr::Number(n) => Ok(Value::from(*n)),
        Expr::Str(s) => Ok(Value::String(s.clone())),
        Expr::Path(path) => resolve_path(path, scope),
        Expr::Neg(inner) => {
            let n = as_number(&eval(inner, scope)?, "-")?;
            Ok(Value::from(-n))
        }
        Expr::Not(inner) => {
            let b = as_bool(&eval(inner, scope)?);
            Ok(Value::Bool(!b))
        }
        Expr::Binary { left, op, right } => eval_binary(*op, left, right, scope),
        Expr::Call { name, args } => eval_call(name, args, scope),
    }
}

fn resolve_path(path: &str, scope: &Value) -> Result<Value> {
    match path {
        "pi" => return Ok(Value::from(std::f64::consts::PI)),
        "e" => return Ok(Value::from(std::f64::consts::E)),
        "true" => return Ok(Value::Bool(true)),
        "false" => return Ok(Value::Bool(false)),
        "null" => return Ok(Value::Null),
        _ => {}
    }
    get_nested(scope, path)
        .cloned()
        .ok_or_else(|| ExpressionError::PathNotFound(path.to_string()))
}

fn eval_binary(op: BinOp, left: &Expr, right: &Expr, scope: &Value) -> Result<Value> {
    // Short-circuit boolean composition.
    match op {
        BinOp::And => {
            let l = eval(left, scope)?;
            if !as_bool(&l) {
                return Ok(Value::Bool(false));
            }
            let r = eval(right, scope)?;
            return Ok(Value::Bool(as_bool(&r)));
        }
        BinOp::Or => {
            let l = eval(left, scope)?;
            if as_bool(&l) {
                return Ok(Value::Bool(true));
            }
            let r = eval(right, scope)?;
            return Ok(Value::Bool(as_bool(&r)));
        }
        _ => {}
    }

    let l = eval(left, scope)?;
    let r = eval(right, scope)?;

    match op {
        BinOp::Add => numeric_or_concat(&l, &r),
        BinOp::Sub => Ok(Value::from(as_number(&l, "-")? - as_number(&r, "-")?)),
        BinOp::Mul => Ok(Value::from(as_number(&l, "*")? * as_number(&r, "*")?)),
        BinOp::Div => {
            let divisor = as_number(&r, "/")?;
            if divisor == 0.0 {
                return Err(ExpressionError::DivisionByZero);
            }
            Ok(Value::from(as_number(&l, "/")? / divisor))
        }
        BinOp::Pow => Ok(Value::from(as_number(&l, "^")?.powf(as_number(&r, "^")?))),
        BinOp::Eq => Ok(Value::Bool(values_equal(&l, &r))),
        BinOp::NotEq => Ok(Value::Bool(!values_equal(&l, &r))),
        BinOp::Lt => compare(&l, &r, "<", |o| o == std::cmp::Ordering::Less),
        BinOp::Gt => compare(&l, &r, ">", |o| o == std::cmp::Ordering::Greater),
        BinOp::LtEq => compare(&l, &r, "<=", |o| o != std::cmp::Ordering::Greater),
        BinOp::GtEq => compare(&l, &r, ">=", |o| o != std::cmp::Ordering::Less),
        BinOp::And | BinOp::Or => unreachable!("handled above"),
    }
}

fn numeric_or_concat(l: &Value, r: &Value) -> Result<Value> {
    if let (Some(a), Some(b)) = (l.as_str(), r.as_str()) {
        return Ok(Value::String(format!("{a}{b}")));
    }
    Ok(Value::from(as_number(l, "+")? + as_number(r, "+")?))
}

fn compare(l: &Value, r: &Value, op: &str, matches: impl Fn(std::cmp::Ordering) -> bool) -> Result<Value> {
    if let (Some(a), Some(b)) = (l.as_str(), r.as_str()) {
        return Ok(Value::Bool(matches(a.cmp(b))));
    }
    let a = as_number(l, op)?;
    let b = as_number(r, op)?;
    let ord = a.partial_cmp(&b).ok_or_else(|| ExpressionError::TypeError { op: op.into() })?;
    Ok(Value::Bool(matches(ord)))
}

fn values_equal(l: &Value, r: &Value) -> bool {
    if let (Some(a), Some(b)) = (l.as_f64(), r.as_f64()) {
        return (a - b).abs() < f64::EPSILON;
    }
    l == r
}

fn eval_call(name: &str, args: &[Expr], scope: &Value) -> Result<Value> {
    let values: Result<Vec<Value>> = args.iter().map(|a| eval(a, scope)).collect();
    let values = values?;

    let arg = |i: usize| -> Result<f64> {
        values
            .get(i)
            .ok_or_else(|| ExpressionError::ArityMismatch {
                name: name.to_string(),
                expected: i + 1,
                actual: values.len(),
            })
            .and_then(|v| as_number(v, name))
    };

    let result = match name {
        "sqrt" => arg(0)?.sqrt(),
        "abs" => arg(0)?.abs(),
        "floor" => arg(0)?.floor(),
        "ceil" => arg(0)?.ceil(),
        "round" => arg(0)?.round(),
        "sin" => arg(0)?.sin(),
        "cos" => arg(0)?.cos(),
        "log" => arg(0)?.ln(),
        "log10" => arg(0)?.log10(),
        other => return Err(ExpressionError::UnknownFunction(other.to_string())),
    };
    if values.len() != 1 {
        return Err(ExpressionError::ArityMismatch {
            name: name.to_string(),
            expected: 1,
            actual: values.len(),
        });
    }
    Ok(Value::from(result))
}

fn as_number(v: &Value, op: &str) -> Result<f64> {
    v.as_f64().ok_or_else(|| ExpressionError::TypeError { op: op.to_string() })
}

/// Truthiness used by `&&`, `||`, `!`: `false`, `null`, `0`, and `""` are
/// falsy; everything else (including non-empty strings/arrays/objects)
/// is truthy.
#[must_use]
pub fn as_bool(v: &Value) -> bool {
    match v {
        Value::Bool(b) => *b,
        Value::Null => false,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn run(src: &str, scope: &Value) -> Value {
        eval(&parse(src).unwrap(), scope).unwrap()
    }

    #[test]
    fn arithmetic_precedence() {
        assert_eq!(run("1 + 2 * 3", &json!({})), json!(7.0));
    }

    #[test]
    fn power_and_parens() {
        assert_eq!(run("(1 + 1) ^ 3", &json!({})), json!(8.0));
    }

    #[test]
    fn division_by_zero_errors() {
        let err = eval(&parse("1 / 0").unwrap(), &json!({})).unwrap_err();
        assert_eq!(err, ExpressionError::DivisionByZero);
    }

    #[test]
    fn comparisons() {
        assert_eq!(run("5 > 3", &json!({})), json!(true));
        assert_eq!(run("5 <= 3", &json!({})), json!(false));
        assert_eq!(run("5 == 5", &json!({})), json!(true));
        assert_eq!(run("5 != 5", &json!({})), json!(false));
    }

    #[test]
    fn boolean_composition() {
        assert_eq!(run("1 == 1 && 2 == 2", &json!({})), json!(true));
        assert_eq!(run("1 == 2 || 2 == 2", &json!({})), json!(true));
        assert_eq!(run("1 == 2 && 2 == 2", &json!({})), json!(false));
    }

    #[test]
    fn path_resolution_against_scope() {
        let scope = json!({"x": 42});
        assert_eq!(run("$json.x > 10", &scope), json!(true));
    }

    #[test]
    fn constants_pi_and_e() {
        let scope = json!({});
        let pi = run("pi", &scope);
        assert!((pi.as_f64().unwrap() - std::f64::consts::PI).abs() < 1e-9);
    }

    #[test]
    fn builtin_functions() {
        assert_eq!(run("sqrt(9)", &json!({})), json!(3.0));
        assert_eq!(run("abs(-5)", &json!({})), json!(5.0));
        assert_eq!(run("floor(1.9)", &json!({})), json!(1.0));
        assert_eq!(run("ceil(1.1)", &json!({})), json!(2.0));
        assert_eq!(run("round(1.5)", &json!({})), json!(2.0));
    }

    #[test]
    fn unknown_function_errors() {
        let err = eval(&parse("bogus(1)").unwrap(), &json!({})).unwrap_err();
        assert_eq!(err, ExpressionError::UnknownFunction("bogus".into()));
    }

    #[test]
    fn missing_path_errors() {
        let err = eval(&parse("$json.missing").unwrap(), &json!({})).unwrap_err();
        assert_eq!(err, ExpressionError::PathNotFound("$json.missing".into()));
    }

    #[test]
    fn string_concatenation_with_plus() {
        assert_eq!(run("'foo' + 'bar'", &json!({})), json!("foobar"));
    }

    #[test]
    fn string_equality() {
        assert_eq!(run("'a' == 'a'", &json!({})), json!(true));
        assert_eq!(run("'a' == 'b'", &json!({})), json!(false));
    }

    #[test]
    fn truthiness_rules() {
        assert!(!as_bool(&json!(false)));
        assert!(!as_bool(&json!(null)));
        assert!(!as_bool(&json!(0)));
        assert!(!as_bool(&json!("")));
        assert!(as_bool(&json!("x")));
        assert!(as_bool(&json!(1)));
        assert!(as_bool(&json!([1])));
    }

    #[test]
    fn unary_not() {
        assert_eq!(run("!false", &json!({})), json!(true));
        assert_eq!(run("!(1 == 2)", &json!({})), json!(true));
    }
}

//! Shared condition evaluation for `condition` and `switch` rules mode
//! (§4.5).

use nebula_expression::get_nested;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

/// One `{leftValue, operator, rightValue}` test.
#[derive(Debug, Clone, Deserialize)]
pub struct Condition {
    /// Template-resolved left-hand operand.
    #[serde(rename = "leftValue")]
    pub left_value: Value,
    /// Comparison operator, e.g. `"greater"`.
    pub operator: Operator,
    /// Template-resolved right-hand operand; absent for unary operators
    /// like `isEmpty`.
    #[serde(rename = "rightValue", default)]
    pub right_value: Value,
}

/// Every comparison operator the `condition`/`switch` nodes support
/// (§4.5 table).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Operator {
    Equal,
    NotEqual,
    Greater,
    GreaterEqual,
    Less,
    LessEqual,
    Contains,
    NotContains,
    StartsWith,
    EndsWith,
    Regex,
    IsEmpty,
    IsNotEmpty,
    IsTrue,
    IsFalse,
    IsNull,
    IsNotNull,
    In,
    NotIn,
    Between,
}

/// How multiple [`Condition`]s combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CombineWith {
    #[default]
    And,
    Or,
}

/// Evaluate a single condition.
#[must_use]
pub fn evaluate(cond: &Condition) -> bool {
    let l = &cond.left_value;
    let r = &cond.right_value;
    match cond.operator {
        Operator::Equal => values_equal(l, r),
        Operator::NotEqual => !values_equal(l, r),
        Operator::Greater => numeric_cmp(l, r, |a, b| a > b),
        Operator::GreaterEqual => numeric_cmp(l, r, |a, b| a >= b),
        Operator::Less => numeric_cmp(l, r, |a, b| a < b),
        Operator::LessEqual => numeric_cmp(l, r, |a, b| a <= b),
        Operator::Contains => contains(l, r),
        Operator::NotContains => !contains(l, r),
        Operator::StartsWith => as_str(l).zip(as_str(r)).is_some_and(|(l, r)| l.starts_with(r)),
        Operator::EndsWith => as_str(l).zip(as_str(r)).is_some_and(|(l, r)| l.ends_with(r)),
        Operator::Regex => as_str(l)
            .zip(as_str(r))
            .and_then(|(l, r)| Regex::new(r).ok().map(|re| re.is_match(l)))
            .unwrap_or(false),
        Operator::IsEmpty => is_empty(l),
        Operator::IsNotEmpty => !is_empty(l),
        Operator::IsTrue => l.as_bool() == Some(true),
        Operator::IsFalse => l.as_bool() == Some(false),
        Operator::IsNull => l.is_null(),
        Operator::IsNotNull => !l.is_null(),
        Operator::In => r.as_array().is_some_and(|items| items.iter().any(|v| values_equal(v, l))),
        Operator::NotIn => !r.as_array().is_some_and(|items| items.iter().any(|v| values_equal(v, l))),
        Operator::Between => between(l, r),
    }
}

/// Combine evaluated results per `combineWith`.
#[must_use]
pub fn combine(results: impl IntoIterator<Item = bool>, with: CombineWith) -> bool {
    let mut results = results.into_iter();
    match with {
        CombineWith::And => results.all(|b| b),
        CombineWith::Or => results.any(|b| b),
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    if let (Some(a), Some(b)) = (a.as_f64(), b.as_f64()) {
        return (a - b).abs() < f64::EPSILON;
    }
    a == b
}

fn numeric_cmp(a: &Value, b: &Value, f: impl Fn(f64, f64) -> bool) -> bool {
    a.as_f64().zip(b.as_f64()).is_some_and(|(a, b)| f(a, b))
}

fn as_str(v: &Value) -> Option<&str> {
    v.as_str()
}

fn contains(haystack: &Value, needle: &Value) -> bool {
    match haystack {
        Value::String(s) => as_str(needle).is_some_and(|n| s.contains(n)),
        Value::Array(items) => items.iter().any(|v| values_equal(v, needle)),
        _ => false,
    }
}

fn is_empty(v: &Value) -> bool {
    match v {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        _ => false,
    }
}

fn between(v: &Value, bounds: &Value) -> bool {
    let Some(arr) = bounds.as_array() else {
        return false;
    };
    let (Some(lo), Some(hi)) = (arr.first().and_then(Value::as_f64), arr.get(1).and_then(Value::as_f64)) else {
        return false;
    };
    v.as_f64().is_some_and(|v| v >= lo && v <= hi)
}

/// Resolve a condition operand: template-or-path-or-literal against
/// `scope`, per §4.1. A thin named wrapper so `condition`/`switch` call
/// sites read declaratively.
#[must_use]
pub fn resolve_operand(raw: &Value, scope: &Value, engine: &nebula_expression::ExpressionEngine) -> Value {
    nebula_expression::resolve(raw, scope, engine)
}

/// Bare dot-path lookup against `scope`, without template wrapping --
/// used when a condition's operand is already known to be a path
/// string rather than a `{{ }}`-wrapped template.
#[must_use]
pub fn lookup_path<'a>(scope: &'a Value, path: &str) -> Option<&'a Value> {
    get_nested(scope, path)
}

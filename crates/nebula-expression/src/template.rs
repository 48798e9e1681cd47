//! `{{ ... }}` template resolution over config maps and arrays (§4.1).

use serde_json::Value;

use crate::engine::ExpressionEngine;
use crate::path::get_nested;

/// Resolve a single template value against `scope`.
///
/// If `value` is a string of the form `{{ <inner> }}`, `<inner>` is
/// trimmed and first tried as an expression; if that fails it is tried
/// as a dot-path lookup against `scope`. If both fail, the original
/// string is returned unchanged so a node handler can decide what to do
/// with it -- resolution never errors (§4.1 guarantee).
///
/// Maps and arrays are resolved recursively; all other values pass
/// through unchanged.
#[must_use]
pub fn resolve(value: &Value, scope: &Value, engine: &ExpressionEngine) -> Value {
    match value {
        Value::String(s) => resolve_string(s, scope, engine),
        Value::Object(map) => {
            let mut out = serde_json::Map::with_capacity(map.len());
            for (k, v) in map {
                out.insert(k.clone(), resolve(v, scope, engine));
            }
            Value::Object(out)
        }
        Value::Array(items) => {
            Value::Array(items.iter().map(|v| resolve(v, scope, engine)).collect())
        }
        other => other.clone(),
    }
}

fn resolve_string(s: &str, scope: &Value, engine: &ExpressionEngine) -> Value {
    let trimmed = s.trim();
    let Some(inner) = unwrap_template(trimmed) else {
        return Value::String(s.to_string());
    };
    let inner = inner.trim();

    if let Ok(value) = engine.evaluate(inner, scope) {
        return value;
    }
    if let Some(found) = get_nested(scope, inner) {
        return found.clone();
    }
    Value::String(s.to_string())
}

fn unwrap_template(s: &str) -> Option<&str> {
    s.strip_prefix("{{").and_then(|rest| rest.strip_suffix("}}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn engine() -> ExpressionEngine {
        ExpressionEngine::new()
    }

    #[test]
    fn non_template_string_passes_through() {
        let v = resolve(&json!("plain"), &json!({}), &engine());
        assert_eq!(v, json!("plain"));
    }

    #[test]
    fn template_path_lookup() {
        let scope = json!({"x": 42});
        let v = resolve(&json!("{{ $json.x }}"), &scope, &engine());
        assert_eq!(v, json!(42));
    }

    #[test]
    fn template_expression_takes_priority_over_path() {
        let scope = json!({"x": 10});
        let v = resolve(&json!("{{ $json.x > 5 }}"), &scope, &engine());
        assert_eq!(v, json!(true));
    }

    #[test]
    fn malformed_template_falls_through_to_literal() {
        let scope = json!({});
        let v = resolve(&json!("{{ $json.missing.deep }}"), &scope, &engine());
        assert_eq!(v, json!("{{ $json.missing.deep }}"));
    }

    #[test]
    fn recurses_into_maps_and_arrays() {
        let scope = json!({"x": 1, "y": 2});
        let config = json!({
            "a": "{{ $json.x }}",
            "list": ["{{ $json.y }}", "literal"],
        });
        let resolved = resolve(&config, &scope, &engine());
        assert_eq!(
            resolved,
            json!({"a": 1, "list": [2, "literal"]})
        );
    }

    #[test]
    fn non_string_values_pass_through_unchanged() {
        let v = resolve(&json!(42), &json!({}), &engine());
        assert_eq!(v, json!(42));
        let v = resolve(&json!(null), &json!({}), &engine());
        assert_eq!(v, json!(null));
    }
}

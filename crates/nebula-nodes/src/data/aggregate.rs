//! `aggregate` node (§3 line 120): reduces an array to a single summary
//! value, optionally grouped by a key path. Supports `count sum avg min
//! max first last concat`.

use async_trait::async_trait;
use nebula_expression::get_nested;
use nebula_node::{ExecutionContext, NodeHandler, NodeMetadata, NodeOutput};
use serde_json::{json, Value};
use std::collections::BTreeMap;

/// Handler for the `aggregate` node type.
pub struct AggregateHandler {
    meta: NodeMetadata,
}

impl AggregateHandler {
    /// Build the handler.
    #[must_use]
    pub fn new() -> Self {
        Self {
            meta: NodeMetadata::new("aggregate", "Aggregate", "Reduces an array to a single summary value"),
        }
    }
}

impl Default for AggregateHandler {
    fn default() -> Self {
        Self::new()
    }
}

fn reduce(operation: &str, field: Option<&str>, items: &[Value]) -> nebula_error::Result<Value> {
    let values: Vec<Value> = match field {
        Some(field) => items
            .iter()
            .filter_map(|item| get_nested(item, field).cloned())
            .collect(),
        None => items.to_vec(),
    };

    Ok(match operation {
        "count" => json!(items.len()),
        "first" => values.first().cloned().unwrap_or(Value::Null),
        "last" => values.last().cloned().unwrap_or(Value::Null),
        "concat" => json!(values
            .iter()
            .map(|v| v.as_str().map_or_else(|| v.to_string(), str::to_string))
            .collect::<Vec<_>>()
            .join("")),
        "sum" => json!(values.iter().filter_map(Value::as_f64).sum::<f64>()),
        "avg" => {
            let nums: Vec<f64> = values.iter().filter_map(Value::as_f64).collect();
            if nums.is_empty() {
                Value::Null
            } else {
                json!(nums.iter().sum::<f64>() / nums.len() as f64)
            }
        }
        "min" => values
            .iter()
            .filter_map(Value::as_f64)
            .fold(None, |acc, v| Some(acc.map_or(v, |a: f64| a.min(v))))
            .map_or(Value::Null, |v| json!(v)),
        "max" => values
            .iter()
            .filter_map(Value::as_f64)
            .fold(None, |acc, v| Some(acc.map_or(v, |a: f64| a.max(v))))
            .map_or(Value::Null, |v| json!(v)),
        other => {
            return Err(nebula_error::Error::validation(format!(
                "unknown aggregate operation: {other}"
            )))
        }
    })
}

fn group_key(item: &Value, group_by: &str) -> String {
    get_nested(item, group_by).map_or_else(|| "null".to_string(), |v| v.as_str().map_or_else(|| v.to_string(), str::to_string))
}

#[async_trait]
impl NodeHandler for AggregateHandler {
    fn node_type(&self) -> &str {
        "aggregate"
    }

    fn metadata(&self) -> &NodeMetadata {
        &self.meta
    }

    async fn execute(&self, ctx: &ExecutionContext) -> nebula_error::Result<NodeOutput> {
        let items = ctx
            .config
            .get("items")
            .and_then(Value::as_array)
            .cloned()
            .ok_or_else(|| nebula_error::Error::validation("aggregate requires an `items` array"))?;
        let operation = ctx
            .config
            .get("operation")
            .and_then(Value::as_str)
            .ok_or_else(|| nebula_error::Error::validation("aggregate requires an `operation`"))?;
        let field = ctx.config.get("field").and_then(Value::as_str);
        let group_by = ctx.config.get("groupBy").and_then(Value::as_str);

        let mut output = NodeOutput::new();
        match group_by {
            Some(group_by) => {
                let mut groups: BTreeMap<String, Vec<Value>> = BTreeMap::new();
                for item in items {
                    groups.entry(group_key(&item, group_by)).or_default().push(item);
                }
                let mut result = serde_json::Map::new();
                for (key, group_items) in groups {
                    result.insert(key, reduce(operation, field, &group_items)?);
                }
                output.insert("result".into(), json!(result));
            }
            None => {
                output.insert("result".into(), reduce(operation, field, &items)?);
            }
        }
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nebula_core::{ExecutionId, NodeId, WorkflowId, WorkspaceId};
    use parking_lot::RwLock;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn ctx(config: Value) -> ExecutionContext {
        ExecutionContext::new(
            ExecutionId::new(),
            WorkflowId::new("wf1"),
            WorkspaceId::new("ws1"),
            NodeId::new("n1"),
            json!({}),
            config.as_object().cloned().unwrap_or_default(),
            Arc::new(RwLock::new(serde_json::Map::new())),
        )
    }

    #[tokio::test]
    async fn sums_a_field() {
        let handler = AggregateHandler::new();
        let ctx = ctx(json!({"items": [{"v": 1}, {"v": 2}, {"v": 3}], "operation": "sum", "field": "v"}));
        let out = handler.execute(&ctx).await.unwrap();
        assert_eq!(out["result"], json!(6.0));
    }

    #[tokio::test]
    async fn groups_by_key() {
        let handler = AggregateHandler::new();
        let ctx = ctx(json!({
            "items": [{"cat": "a", "v": 1}, {"cat": "a", "v": 2}, {"cat": "b", "v": 10}],
            "operation": "sum",
            "field": "v",
            "groupBy": "cat"
        }));
        let out = handler.execute(&ctx).await.unwrap();
        assert_eq!(out["result"]["a"], json!(3.0));
        assert_eq!(out["result"]["b"], json!(10.0));
    }

    #[tokio::test]
    async fn count_ignores_field() {
        let handler = AggregateHandler::new();
        let ctx = ctx(json!({"items": [1, 2, 3], "operation": "count"}));
        let out = handler.execute(&ctx).await.unwrap();
        assert_eq!(out["result"], json!(3));
    }
}

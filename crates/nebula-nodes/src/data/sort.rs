//! `sort` node (§4.5 data-transform set): orders an array by one or
//! more key paths.

use async_trait::async_trait;
use nebula_expression::get_nested;
use nebula_node::{ExecutionContext, NodeHandler, NodeMetadata, NodeOutput};
use serde_json::{json, Value};
use std::cmp::Ordering;

/// One `{field, order}` sort key.
struct SortKey {
    field: String,
    descending: bool,
}

/// Handler for the `sort` node type.
pub struct SortHandler {
    meta: NodeMetadata,
}

impl SortHandler {
    /// Build the handler.
    #[must_use]
    pub fn new() -> Self {
        Self {
            meta: NodeMetadata::new("sort", "Sort", "Orders an array by one or more key paths"),
        }
    }
}

impl Default for SortHandler {
    fn default() -> Self {
        Self::new()
    }
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a.as_f64(), b.as_f64()) {
        (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
        _ => a.as_str().unwrap_or_default().cmp(b.as_str().unwrap_or_default()),
    }
}

fn keys_from_config(ctx: &ExecutionContext) -> Vec<SortKey> {
    ctx.config
        .get("keys")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_object)
                .map(|obj| SortKey {
                    field: obj.get("field").and_then(Value::as_str).unwrap_or_default().to_string(),
                    descending: obj.get("order").and_then(Value::as_str) == Some("desc"),
                })
                .collect()
        })
        .unwrap_or_else(|| {
            let field = ctx.config.get("field").and_then(Value::as_str).unwrap_or_default().to_string();
            vec![SortKey {
                field,
                descending: ctx.config.get("order").and_then(Value::as_str) == Some("desc"),
            }]
        })
}

#[async_trait]
impl NodeHandler for SortHandler {
    fn node_type(&self) -> &str {
        "sort"
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
            .ok_or_else(|| nebula_error::Error::validation("sort requires an `items` array"))?;

        let keys = keys_from_config(ctx);
        let mut items = items;
        items.sort_by(|a, b| {
            for key in &keys {
                let av = get_nested(a, &key.field).cloned().unwrap_or(Value::Null);
                let bv = get_nested(b, &key.field).cloned().unwrap_or(Value::Null);
                let ordering = compare_values(&av, &bv);
                let ordering = if key.descending { ordering.reverse() } else { ordering };
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            Ordering::Equal
        });

        let mut output = NodeOutput::new();
        output.insert("count".into(), json!(items.len()));
        output.insert("items".into(), json!(items));
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
    async fn sorts_ascending_by_field() {
        let handler = SortHandler::new();
        let ctx = ctx(json!({"items": [{"age": 30}, {"age": 10}, {"age": 20}], "field": "age"}));
        let out = handler.execute(&ctx).await.unwrap();
        let ages: Vec<i64> = out["items"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v["age"].as_i64().unwrap())
            .collect();
        assert_eq!(ages, vec![10, 20, 30]);
    }

    #[tokio::test]
    async fn sorts_descending_with_multiple_keys() {
        let handler = SortHandler::new();
        let ctx = ctx(json!({
            "items": [{"a": 1, "b": 2}, {"a": 1, "b": 1}],
            "keys": [{"field": "a", "order": "asc"}, {"field": "b", "order": "desc"}]
        }));
        let out = handler.execute(&ctx).await.unwrap();
        let bs: Vec<i64> = out["items"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v["b"].as_i64().unwrap())
            .collect();
        assert_eq!(bs, vec![2, 1]);
    }
}

//! `remove_duplicates` node (§4.5 data-transform set): removes every
//! item whose key has more than one occurrence, unlike `unique` which
//! keeps the first one it sees.

use async_trait::async_trait;
use nebula_expression::get_nested;
use nebula_node::{ExecutionContext, NodeHandler, NodeMetadata, NodeOutput};
use serde_json::{json, Value};
use std::collections::HashMap;

/// Handler for the `remove_duplicates` node type.
pub struct RemoveDuplicatesHandler {
    meta: NodeMetadata,
}

impl RemoveDuplicatesHandler {
    /// Build the handler.
    #[must_use]
    pub fn new() -> Self {
        Self {
            meta: NodeMetadata::new(
                "remove_duplicates",
                "Remove Duplicates",
                "Removes every item whose key occurs more than once",
            ),
        }
    }
}

impl Default for RemoveDuplicatesHandler {
    fn default() -> Self {
        Self::new()
    }
}

fn key_for(item: &Value, field: Option<&str>) -> String {
    match field {
        Some(field) => get_nested(item, field).map_or_else(|| "null".to_string(), |v| v.to_string()),
        None => item.to_string(),
    }
}

#[async_trait]
impl NodeHandler for RemoveDuplicatesHandler {
    fn node_type(&self) -> &str {
        "remove_duplicates"
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
            .ok_or_else(|| nebula_error::Error::validation("remove_duplicates requires an `items` array"))?;
        let field = ctx.config.get("field").and_then(Value::as_str);

        let mut counts: HashMap<String, usize> = HashMap::new();
        for item in &items {
            *counts.entry(key_for(item, field)).or_insert(0) += 1;
        }

        let kept: Vec<Value> = items
            .into_iter()
            .filter(|item| counts.get(&key_for(item, field)).copied().unwrap_or(0) == 1)
            .collect();

        let mut output = NodeOutput::new();
        output.insert("count".into(), json!(kept.len()));
        output.insert("items".into(), json!(kept));
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
    async fn drops_every_occurrence_of_a_repeated_key() {
        let handler = RemoveDuplicatesHandler::new();
        let ctx = ctx(json!({"items": [1, 2, 1, 3]}));
        let out = handler.execute(&ctx).await.unwrap();
        assert_eq!(out["items"], json!([2, 3]));
    }

    #[tokio::test]
    async fn keeps_singleton_keys_by_field() {
        let handler = RemoveDuplicatesHandler::new();
        let ctx = ctx(json!({
            "items": [{"id": 1}, {"id": 1}, {"id": 2}],
            "field": "id"
        }));
        let out = handler.execute(&ctx).await.unwrap();
        assert_eq!(out["count"], json!(1));
        assert_eq!(out["items"][0]["id"], json!(2));
    }
}

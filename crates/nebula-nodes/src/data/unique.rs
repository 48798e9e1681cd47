//! `unique` node (§4.5 data-transform set): drops array items whose key
//! has already been seen, keeping the first occurrence.

use async_trait::async_trait;
use nebula_expression::get_nested;
use nebula_node::{ExecutionContext, NodeHandler, NodeMetadata, NodeOutput};
use serde_json::{json, Value};
use std::collections::HashSet;

/// Handler for the `unique` node type.
pub struct UniqueHandler {
    meta: NodeMetadata,
}

impl UniqueHandler {
    /// Build the handler.
    #[must_use]
    pub fn new() -> Self {
        Self {
            meta: NodeMetadata::new("unique", "Unique", "Drops items whose key has already been seen"),
        }
    }
}

impl Default for UniqueHandler {
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
impl NodeHandler for UniqueHandler {
    fn node_type(&self) -> &str {
        "unique"
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
            .ok_or_else(|| nebula_error::Error::validation("unique requires an `items` array"))?;
        let field = ctx.config.get("field").and_then(Value::as_str);

        let mut seen = HashSet::new();
        let mut kept = Vec::new();
        for item in items {
            if seen.insert(key_for(&item, field)) {
                kept.push(item);
            }
        }

        let mut output = NodeOutput::new();
        output.insert("count".into(), json!(kept.len()));
        output.insert("items".into(), json!(kept));
        Ok(output)
    }
}

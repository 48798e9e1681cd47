//! `limit` node (§4.5 data-transform set): truncates an array to at
//! most `count` items, optionally skipping a leading `offset`.

use async_trait::async_trait;
use nebula_node::{ExecutionContext, NodeHandler, NodeMetadata, NodeOutput};
use serde_json::{json, Value};

/// Handler for the `limit` node type.
pub struct LimitHandler {
    meta: NodeMetadata,
}

impl LimitHandler {
    /// Build the handler.
    #[must_use]
    pub fn new() -> Self {
        Self {
            meta: NodeMetadata::new("limit", "Limit", "Truncates an array to at most `count` items"),
        }
    }
}

impl Default for LimitHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NodeHandler for LimitHandler {
    fn node_type(&self) -> &str {
        "limit"
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
            .ok_or_else(|| nebula_error::Error::validation("limit requires an `items` array"))?;
        let offset = ctx.config.get("offset").and_then(Value::as_u64).unwrap_or(0) as usize;
        let count = ctx.config.get("count").and_then(Value::as_u64).unwrap_or(u64::MAX) as usize;

        let limited: Vec<Value> = items.into_iter().skip(offset).take(count).collect();

        let mut output = NodeOutput::new();
        output.insert("count".into(), json!(limited.len()));
        output.insert("items".into(), json!(limited));
        Ok(output)
    }
}

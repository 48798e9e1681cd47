//! `split_batches` node (§4.5 data-transform set): chunks an array into
//! fixed-size batches.

use async_trait::async_trait;
use nebula_node::{ExecutionContext, NodeHandler, NodeMetadata, NodeOutput};
use serde_json::{json, Value};

/// Handler for the `split_batches` node type.
pub struct SplitBatchesHandler {
    meta: NodeMetadata,
}

impl SplitBatchesHandler {
    /// Build the handler.
    #[must_use]
    pub fn new() -> Self {
        Self {
            meta: NodeMetadata::new("split_batches", "Split Into Batches", "Chunks an array into fixed-size batches"),
        }
    }
}

impl Default for SplitBatchesHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NodeHandler for SplitBatchesHandler {
    fn node_type(&self) -> &str {
        "split_batches"
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
            .ok_or_else(|| nebula_error::Error::validation("split_batches requires an `items` array"))?;
        let batch_size = ctx
            .config
            .get("batchSize")
            .and_then(Value::as_u64)
            .filter(|&n| n > 0)
            .ok_or_else(|| nebula_error::Error::validation("split_batches requires a positive `batchSize`"))?
            as usize;

        let batches: Vec<Vec<Value>> = items.chunks(batch_size).map(<[Value]>::to_vec).collect();

        let mut output = NodeOutput::new();
        output.insert("batchCount".into(), json!(batches.len()));
        output.insert("batches".into(), json!(batches));
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
    async fn chunks_evenly() {
        let handler = SplitBatchesHandler::new();
        let ctx = ctx(json!({"items": [1, 2, 3, 4], "batchSize": 2}));
        let out = handler.execute(&ctx).await.unwrap();
        assert_eq!(out["batches"], json!([[1, 2], [3, 4]]));
    }

    #[tokio::test]
    async fn last_batch_may_be_partial() {
        let handler = SplitBatchesHandler::new();
        let ctx = ctx(json!({"items": [1, 2, 3, 4, 5], "batchSize": 2}));
        let out = handler.execute(&ctx).await.unwrap();
        assert_eq!(out["batchCount"], json!(3));
        assert_eq!(out["batches"][2], json!([5]));
    }

    #[tokio::test]
    async fn zero_batch_size_is_validation_error() {
        let handler = SplitBatchesHandler::new();
        let ctx = ctx(json!({"items": [1], "batchSize": 0}));
        let err = handler.execute(&ctx).await.unwrap_err();
        assert_eq!(err.kind(), nebula_error::Kind::Validation);
    }
}

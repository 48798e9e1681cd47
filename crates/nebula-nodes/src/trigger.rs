//! Trigger passthrough handler (§3 "seed its input with inputData under
//! the `$json` key", §4.4 step 2).
//!
//! A trigger node does no work of its own: the executor's graph walk
//! (§4.4) looks up and invokes a handler for *every* ready-queue entry,
//! the trigger included, so the trigger's type string needs a
//! registered handler like any other node. Its only job is to make the
//! execution's `inputData` observable as the trigger node's own output,
//! so the first downstream node's `$json` resolves to that payload
//! (e.g. `{{ $json.x }}` against `{x:42}` in the linear-IF-branch
//! scenario).

use async_trait::async_trait;
use nebula_node::{ExecutionContext, NodeHandler, NodeMetadata, NodeOutput};

/// Echoes `$input` (the execution's trigger payload) back as this
/// node's output. Registered under every trigger type string this
/// workspace's fixtures and examples use (`manual`, `trigger.manual`).
pub struct TriggerHandler {
    node_type: String,
    meta: NodeMetadata,
}

impl TriggerHandler {
    /// Build a passthrough handler answering to `node_type`.
    #[must_use]
    pub fn new(node_type: impl Into<String>) -> Self {
        let node_type = node_type.into();
        let meta = NodeMetadata::new(
            node_type.clone(),
            "Trigger",
            "Workflow entry point; echoes the execution's input payload as its output",
        );
        Self { node_type, meta }
    }
}

#[async_trait]
impl NodeHandler for TriggerHandler {
    fn node_type(&self) -> &str {
        &self.node_type
    }

    fn metadata(&self) -> &NodeMetadata {
        &self.meta
    }

    async fn execute(&self, ctx: &ExecutionContext) -> nebula_error::Result<NodeOutput> {
        Ok(ctx
            .input
            .get("$input")
            .and_then(serde_json::Value::as_object)
            .cloned()
            .unwrap_or_default())
    }
}

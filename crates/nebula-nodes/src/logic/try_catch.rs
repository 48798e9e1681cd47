//! `try_catch` node (§4.5, §7 point 3): routes based on whether `$error`
//! is present on the assembled input, never inspecting the raw error
//! chain itself.

use async_trait::async_trait;
use nebula_node::{ExecutionContext, NodeHandler, NodeMetadata, NodeOutput};
use serde_json::json;

/// Handler for the `try_catch` node type.
pub struct TryCatchHandler {
    meta: NodeMetadata,
}

impl TryCatchHandler {
    /// Build the handler.
    #[must_use]
    pub fn new() -> Self {
        Self {
            meta: NodeMetadata::new("try_catch", "Try/Catch", "Routes `$error` to the error port"),
        }
    }
}

impl Default for TryCatchHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NodeHandler for TryCatchHandler {
    fn node_type(&self) -> &str {
        "try_catch"
    }

    fn metadata(&self) -> &NodeMetadata {
        &self.meta
    }

    async fn execute(&self, ctx: &ExecutionContext) -> nebula_error::Result<NodeOutput> {
        let error = ctx.input.get("$error").cloned();
        let mut output = NodeOutput::new();
        if let Some(error) = error {
            output.insert("branch".into(), json!("error"));
            output.insert("error".into(), error);
        } else {
            output.insert("branch".into(), json!("success"));
        }
        Ok(output)
    }
}

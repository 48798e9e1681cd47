//! `continue_on_fail` node (§4.5): swallows `$error` unconditionally,
//! always succeeding with a `{success, error}` summary.

use async_trait::async_trait;
use nebula_node::{ExecutionContext, NodeHandler, NodeMetadata, NodeOutput};
use serde_json::json;

/// Handler for the `continue_on_fail` node type.
pub struct ContinueOnFailHandler {
    meta: NodeMetadata,
}

impl ContinueOnFailHandler {
    /// Build the handler.
    #[must_use]
    pub fn new() -> Self {
        Self {
            meta: NodeMetadata::new(
                "continue_on_fail",
                "Continue On Fail",
                "Swallows `$error` and always succeeds",
            ),
        }
    }
}

impl Default for ContinueOnFailHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NodeHandler for ContinueOnFailHandler {
    fn node_type(&self) -> &str {
        "continue_on_fail"
    }

    fn metadata(&self) -> &NodeMetadata {
        &self.meta
    }

    async fn execute(&self, ctx: &ExecutionContext) -> nebula_error::Result<NodeOutput> {
        let error = ctx.input.get("$error").cloned();
        let mut output = NodeOutput::new();
        output.insert("success".into(), json!(error.is_none()));
        output.insert("error".into(), error.unwrap_or(serde_json::Value::Null));
        Ok(output)
    }
}

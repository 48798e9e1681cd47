//! `timeout` node (§4.5): reacts to a deadline-exceeded `$error` from
//! the node it guards, per its `onTimeout` policy. The actual per-node
//! deadline is enforced generically by the executor for every node type
//! (§4.4); this handler only decides what happens after one fires.

use async_trait::async_trait;
use nebula_node::{ExecutionContext, NodeHandler, NodeMetadata, NodeOutput};
use serde_json::json;

/// Handler for the `timeout` node type.
pub struct TimeoutHandler {
    meta: NodeMetadata,
}

impl TimeoutHandler {
    /// Build the handler.
    #[must_use]
    pub fn new() -> Self {
        Self {
            meta: NodeMetadata::new("timeout", "Timeout", "Reacts to an upstream deadline-exceeded error"),
        }
    }
}

impl Default for TimeoutHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NodeHandler for TimeoutHandler {
    fn node_type(&self) -> &str {
        "timeout"
    }

    fn metadata(&self) -> &NodeMetadata {
        &self.meta
    }

    async fn execute(&self, ctx: &ExecutionContext) -> nebula_error::Result<NodeOutput> {
        let Some(error) = ctx.input.get("$error").cloned() else {
            let mut output = NodeOutput::new();
            output.insert("timedOut".into(), json!(false));
            return Ok(output);
        };

        let on_timeout = ctx
            .config
            .get("onTimeout")
            .and_then(serde_json::Value::as_str)
            .unwrap_or("error");

        match on_timeout {
            "continue" => {
                let mut output = NodeOutput::new();
                output.insert("timedOut".into(), json!(true));
                output.insert("error".into(), error);
                Ok(output)
            }
            "default" => {
                let mut output = NodeOutput::new();
                output.insert("timedOut".into(), json!(true));
                output.insert(
                    "value".into(),
                    ctx.config.get("defaultValue").cloned().unwrap_or(serde_json::Value::Null),
                );
                Ok(output)
            }
            _ => {
                let message = error
                    .get("message")
                    .and_then(serde_json::Value::as_str)
                    .unwrap_or("node timed out");
                Err(nebula_error::Error::timeout(message))
            }
        }
    }
}

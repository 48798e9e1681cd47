//! `wait` node (§4.5): sleeps for a configured duration, honoring
//! cancellation.

use std::time::Duration;

use async_trait::async_trait;
use nebula_node::{ExecutionContext, NodeHandler, NodeMetadata, NodeOutput};
use serde_json::json;

/// Handler for the `wait` node type.
pub struct WaitHandler {
    meta: NodeMetadata,
}

impl WaitHandler {
    /// Build the handler.
    #[must_use]
    pub fn new() -> Self {
        Self {
            meta: NodeMetadata::new("wait", "Wait", "Sleeps for a configured duration"),
        }
    }
}

impl Default for WaitHandler {
    fn default() -> Self {
        Self::new()
    }
}

fn unit_ms(unit: &str) -> nebula_error::Result<u64> {
    match unit {
        "ms" => Ok(1),
        "s" => Ok(1_000),
        "m" => Ok(60_000),
        "h" => Ok(3_600_000),
        other => Err(nebula_error::Error::validation(format!("unknown wait unit: {other}"))),
    }
}

#[async_trait]
impl NodeHandler for WaitHandler {
    fn node_type(&self) -> &str {
        "wait"
    }

    fn metadata(&self) -> &NodeMetadata {
        &self.meta
    }

    async fn execute(&self, ctx: &ExecutionContext) -> nebula_error::Result<NodeOutput> {
        let amount = ctx
            .config
            .get("amount")
            .and_then(serde_json::Value::as_u64)
            .ok_or_else(|| nebula_error::Error::validation("wait requires `amount`"))?;
        let unit = ctx
            .config
            .get("unit")
            .and_then(serde_json::Value::as_str)
            .unwrap_or("s");
        let max_wait_s = ctx.config.get("maxWait").and_then(serde_json::Value::as_u64);

        let mut millis = amount.saturating_mul(unit_ms(unit)?);
        if let Some(max_wait_s) = max_wait_s {
            millis = millis.min(max_wait_s.saturating_mul(1_000));
        }

        tokio::select! {
            () = tokio::time::sleep(Duration::from_millis(millis)) => {}
            () = ctx.cancellation.cancelled() => {
                return Err(nebula_error::Error::cancelled());
            }
        }

        let mut output = NodeOutput::new();
        output.insert("waitedMs".into(), json!(millis));
        Ok(output)
    }
}

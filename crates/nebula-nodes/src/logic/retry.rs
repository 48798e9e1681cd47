//! `retry` node (§4.5, §8 "Retry bound" invariant): reads `$error` from
//! its input (set by an upstream node's `onError: branch(errorPort)`)
//! and decides whether the executor should re-enqueue the upstream node
//! after a backoff delay, or give up.
//!
//! Attempt count is tracked per-node in the execution's `variables` map
//! under a private key, since a single `execute` call cannot itself
//! observe multiple attempts -- the executor re-invokes this node once
//! per retry cycle.

use async_trait::async_trait;
use nebula_core::BackoffType;
use nebula_node::{ExecutionContext, NodeHandler, NodeMetadata, NodeOutput};
use serde_json::json;

/// Handler for the `retry` node type.
pub struct RetryHandler {
    meta: NodeMetadata,
}

impl RetryHandler {
    /// Build the handler.
    #[must_use]
    pub fn new() -> Self {
        Self {
            meta: NodeMetadata::new("retry", "Retry", "Re-enqueues the failed upstream node with backoff"),
        }
    }
}

impl Default for RetryHandler {
    fn default() -> Self {
        Self::new()
    }
}

fn attempt_key(node_id: &str) -> String {
    format!("__retry_attempts:{node_id}")
}

#[async_trait]
impl NodeHandler for RetryHandler {
    fn node_type(&self) -> &str {
        "retry"
    }

    fn metadata(&self) -> &NodeMetadata {
        &self.meta
    }

    async fn execute(&self, ctx: &ExecutionContext) -> nebula_error::Result<NodeOutput> {
        let Some(error) = ctx.input.get("$error").cloned() else {
            return Err(nebula_error::Error::validation(
                "retry requires an upstream `$error`",
            ));
        };

        let max_retries = ctx
            .config
            .get("maxRetries")
            .and_then(serde_json::Value::as_u64)
            .unwrap_or(0) as u32;
        let initial_delay_ms = ctx
            .config
            .get("initialDelay")
            .and_then(serde_json::Value::as_u64)
            .unwrap_or(1_000);
        let max_delay_ms = ctx
            .config
            .get("maxDelay")
            .and_then(serde_json::Value::as_u64)
            .unwrap_or(30_000);
        let backoff: BackoffType = ctx
            .config
            .get("backoffType")
            .cloned()
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| nebula_error::Error::validation(format!("invalid backoffType: {e}")))?
            .unwrap_or_default();
        let retry_on: Vec<String> = ctx
            .config
            .get("retryOn")
            .and_then(serde_json::Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(serde_json::Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let message = error
            .get("message")
            .and_then(serde_json::Value::as_str)
            .unwrap_or_default();
        let matches_pattern = retry_on.is_empty() || retry_on.iter().any(|p| message.contains(p.as_str()));

        let key = attempt_key(ctx.node_id.as_str());
        let attempt = ctx
            .get_variable(&key)
            .and_then(|v| v.as_u64())
            .unwrap_or(0) as u32;

        let mut output = NodeOutput::new();
        if matches_pattern && attempt < max_retries {
            let next_attempt = attempt + 1;
            ctx.set_variable(key, json!(next_attempt));
            let delay_ms = backoff.delay_ms(next_attempt, initial_delay_ms, max_delay_ms);
            output.insert("branch".into(), json!("main"));
            output.insert("attempt".into(), json!(next_attempt));
            output.insert("delayMs".into(), json!(delay_ms));
        } else {
            output.insert("branch".into(), json!("exhausted"));
            output.insert("error".into(), error);
            output.insert("attempts".into(), json!(attempt + 1));
        }
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

    fn ctx(variables: serde_json::Map<String, serde_json::Value>) -> ExecutionContext {
        ExecutionContext::new(
            ExecutionId::new(),
            WorkflowId::new("wf1"),
            WorkspaceId::new("ws1"),
            NodeId::new("retry1"),
            json!({"$error": {"message": "connection reset"}}),
            serde_json::json!({
                "maxRetries": 2,
                "initialDelay": 10,
                "maxDelay": 1000,
                "backoffType": "exponential"
            })
            .as_object()
            .cloned()
            .unwrap(),
            Arc::new(RwLock::new(variables)),
        )
    }

    #[tokio::test]
    async fn retries_until_exhausted() {
        let handler = RetryHandler::new();
        let vars = Arc::new(RwLock::new(serde_json::Map::new()));

        for expected_attempt in 1..=2 {
            let ctx = ExecutionContext::new(
                ExecutionId::new(),
                WorkflowId::new("wf1"),
                WorkspaceId::new("ws1"),
                NodeId::new("retry1"),
                json!({"$error": {"message": "connection reset"}}),
                serde_json::json!({"maxRetries": 2, "initialDelay": 10, "maxDelay": 1000})
                    .as_object()
                    .cloned()
                    .unwrap(),
                vars.clone(),
            );
            let out = handler.execute(&ctx).await.unwrap();
            assert_eq!(out["branch"], json!("main"));
            assert_eq!(out["attempt"], json!(expected_attempt));
        }

        let ctx = ExecutionContext::new(
            ExecutionId::new(),
            WorkflowId::new("wf1"),
            WorkspaceId::new("ws1"),
            NodeId::new("retry1"),
            json!({"$error": {"message": "connection reset"}}),
            serde_json::json!({"maxRetries": 2, "initialDelay": 10, "maxDelay": 1000})
                .as_object()
                .cloned()
                .unwrap(),
            vars,
        );
        let out = handler.execute(&ctx).await.unwrap();
        assert_eq!(out["branch"], json!("exhausted"));
        assert_eq!(out["attempts"], json!(3));
    }

    #[tokio::test]
    async fn exponential_backoff_doubles() {
        let handler = RetryHandler::new();
        let ctx = ctx(serde_json::Map::new());
        let out = handler.execute(&ctx).await.unwrap();
        assert_eq!(out["delayMs"], json!(10));
    }

    #[tokio::test]
    async fn non_matching_retry_on_goes_straight_to_exhausted() {
        let handler = RetryHandler::new();
        let mut config = serde_json::json!({"maxRetries": 5, "retryOn": ["timeout"]})
            .as_object()
            .cloned()
            .unwrap();
        config.insert("initialDelay".into(), json!(10));
        config.insert("maxDelay".into(), json!(1000));
        let ctx = ExecutionContext::new(
            ExecutionId::new(),
            WorkflowId::new("wf1"),
            WorkspaceId::new("ws1"),
            NodeId::new("retry1"),
            json!({"$error": {"message": "connection reset"}}),
            config,
            Arc::new(RwLock::new(serde_json::Map::new())),
        );
        let out = handler.execute(&ctx).await.unwrap();
        assert_eq!(out["branch"], json!("exhausted"));
    }
}

//! `throw_error` node (§4.5): always fails with a typed, user-authored
//! error.

use async_trait::async_trait;
use nebula_node::{ExecutionContext, NodeHandler, NodeMetadata, NodeOutput};

/// Handler for the `throw_error` node type.
pub struct ThrowErrorHandler {
    meta: NodeMetadata,
}

impl ThrowErrorHandler {
    /// Build the handler.
    #[must_use]
    pub fn new() -> Self {
        Self {
            meta: NodeMetadata::new("throw_error", "Throw Error", "Always fails with a configured error"),
        }
    }
}

impl Default for ThrowErrorHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NodeHandler for ThrowErrorHandler {
    fn node_type(&self) -> &str {
        "throw_error"
    }

    fn metadata(&self) -> &NodeMetadata {
        &self.meta
    }

    async fn execute(&self, ctx: &ExecutionContext) -> nebula_error::Result<NodeOutput> {
        let error_type = ctx
            .config
            .get("errorType")
            .and_then(serde_json::Value::as_str)
            .unwrap_or("handler");
        let message = ctx
            .config
            .get("errorMessage")
            .and_then(serde_json::Value::as_str)
            .unwrap_or("explicit throw_error");

        let err = match error_type {
            "fatal" => nebula_error::Error::fatal(message),
            "timeout" => nebula_error::Error::timeout(message),
            "transient" => nebula_error::Error::transient(message),
            "validation" => nebula_error::Error::validation(message),
            _ => nebula_error::Error::handler(message),
        };
        Err(err.with_node(ctx.node_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nebula_core::{ExecutionId, NodeId, WorkflowId, WorkspaceId};
    use parking_lot::RwLock;
    use std::sync::Arc;

    fn ctx(config: serde_json::Value) -> ExecutionContext {
        ExecutionContext::new(
            ExecutionId::new(),
            WorkflowId::new("wf1"),
            WorkspaceId::new("ws1"),
            NodeId::new("n1"),
            serde_json::json!({}),
            config.as_object().cloned().unwrap_or_default(),
            Arc::new(RwLock::new(serde_json::Map::new())),
        )
    }

    #[tokio::test]
    async fn always_fails_with_configured_kind() {
        let handler = ThrowErrorHandler::new();
        let ctx = ctx(serde_json::json!({"errorType": "fatal", "errorMessage": "nope"}));
        let err = handler.execute(&ctx).await.unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(err.message(), "nope");
        assert_eq!(err.node_id(), Some("n1"));
    }

    #[tokio::test]
    async fn defaults_to_handler_kind() {
        let handler = ThrowErrorHandler::new();
        let ctx = ctx(serde_json::json!({}));
        let err = handler.execute(&ctx).await.unwrap_err();
        assert_eq!(err.kind(), nebula_error::Kind::Handler);
    }
}

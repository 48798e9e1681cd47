//! `fallback` node (§4.5): substitutes a configured value when `$error`
//! matches one of `useFallbackOn`'s patterns.

use async_trait::async_trait;
use nebula_node::{ExecutionContext, NodeHandler, NodeMetadata, NodeOutput};

/// Handler for the `fallback` node type.
pub struct FallbackHandler {
    meta: NodeMetadata,
}

impl FallbackHandler {
    /// Build the handler.
    #[must_use]
    pub fn new() -> Self {
        Self {
            meta: NodeMetadata::new("fallback", "Fallback", "Substitutes a value on matching error"),
        }
    }
}

impl Default for FallbackHandler {
    fn default() -> Self {
        Self::new()
    }
}

fn error_message(error: &serde_json::Value) -> String {
    error
        .get("message")
        .and_then(serde_json::Value::as_str)
        .map_or_else(|| error.to_string(), str::to_string)
}

#[async_trait]
impl NodeHandler for FallbackHandler {
    fn node_type(&self) -> &str {
        "fallback"
    }

    fn metadata(&self) -> &NodeMetadata {
        &self.meta
    }

    async fn execute(&self, ctx: &ExecutionContext) -> nebula_error::Result<NodeOutput> {
        let Some(error) = ctx.input.get("$error") else {
            return Err(nebula_error::Error::validation(
                "fallback requires an upstream `$error`",
            ));
        };

        let patterns: Vec<String> = ctx
            .config
            .get("useFallbackOn")
            .and_then(serde_json::Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(serde_json::Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let message = error_message(error);
        let matches = patterns.is_empty() || patterns.iter().any(|p| message.contains(p.as_str()));

        let mut output = NodeOutput::new();
        if matches {
            let fallback = ctx
                .config
                .get("fallbackValue")
                .cloned()
                .unwrap_or(serde_json::Value::Null);
            output.insert("value".into(), fallback);
            output.insert("usedFallback".into(), serde_json::json!(true));
        } else {
            return Err(nebula_error::Error::handler(message));
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

    fn ctx(input: serde_json::Value, config: serde_json::Value) -> ExecutionContext {
        ExecutionContext::new(
            ExecutionId::new(),
            WorkflowId::new("wf1"),
            WorkspaceId::new("ws1"),
            NodeId::new("n1"),
            input,
            config.as_object().cloned().unwrap_or_default(),
            Arc::new(RwLock::new(serde_json::Map::new())),
        )
    }

    #[tokio::test]
    async fn substitutes_value_on_matching_pattern() {
        let handler = FallbackHandler::new();
        let ctx = ctx(
            serde_json::json!({"$error": {"message": "connection reset"}}),
            serde_json::json!({"fallbackValue": "default", "useFallbackOn": ["reset"]}),
        );
        let out = handler.execute(&ctx).await.unwrap();
        assert_eq!(out["value"], serde_json::json!("default"));
        assert_eq!(out["usedFallback"], serde_json::json!(true));
    }

    #[tokio::test]
    async fn rethrows_on_non_matching_pattern() {
        let handler = FallbackHandler::new();
        let ctx = ctx(
            serde_json::json!({"$error": {"message": "auth failed"}}),
            serde_json::json!({"fallbackValue": "default", "useFallbackOn": ["reset"]}),
        );
        let err = handler.execute(&ctx).await.unwrap_err();
        assert_eq!(err.kind(), nebula_error::Kind::Handler);
    }

    #[tokio::test]
    async fn empty_pattern_list_always_matches() {
        let handler = FallbackHandler::new();
        let ctx = ctx(
            serde_json::json!({"$error": {"message": "anything"}}),
            serde_json::json!({"fallbackValue": "x"}),
        );
        let out = handler.execute(&ctx).await.unwrap();
        assert_eq!(out["usedFallback"], serde_json::json!(true));
    }
}

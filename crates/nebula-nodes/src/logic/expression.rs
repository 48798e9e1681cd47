//! `expression` node (§4.2): evaluates one restricted expression against
//! the assembled input and returns its value. Unlike `condition`/
//! `switch`, the result is not coerced to a branch -- it is handed
//! downstream verbatim for use in later templates.

use async_trait::async_trait;
use nebula_expression::ExpressionEngine;
use nebula_node::{ExecutionContext, NodeHandler, NodeMetadata, NodeOutput};
use serde_json::Value;

/// Handler for the `expression` node type.
pub struct ExpressionHandler {
    meta: NodeMetadata,
    engine: ExpressionEngine,
}

impl ExpressionHandler {
    /// Build the handler.
    #[must_use]
    pub fn new() -> Self {
        Self {
            meta: NodeMetadata::new(
                "expression",
                "Expression",
                "Evaluates a restricted expression and returns its value",
            ),
            engine: ExpressionEngine::new(),
        }
    }
}

impl Default for ExpressionHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NodeHandler for ExpressionHandler {
    fn node_type(&self) -> &str {
        "expression"
    }

    fn metadata(&self) -> &NodeMetadata {
        &self.meta
    }

    async fn execute(&self, ctx: &ExecutionContext) -> nebula_error::Result<NodeOutput> {
        let source = ctx
            .config
            .get("expression")
            .and_then(Value::as_str)
            .ok_or_else(|| nebula_error::Error::validation("expression requires `expression`"))?;

        let value = self
            .engine
            .evaluate(source, &ctx.input)
            .map_err(|e| nebula_error::Error::template(e.to_string()).with_node(ctx.node_id.to_string()))?;

        let mut output = NodeOutput::new();
        output.insert("value".into(), value);
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nebula_core::{ExecutionId, NodeId, WorkflowId, WorkspaceId};
    use parking_lot::RwLock;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Arc;

    fn ctx(input: Value, config: Value) -> ExecutionContext {
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
    async fn evaluates_arithmetic_over_scope() {
        let handler = ExpressionHandler::new();
        let ctx = ctx(json!({"x": 5}), json!({"expression": "$json.x * 2 + 1"}));
        let out = handler.execute(&ctx).await.unwrap();
        assert_eq!(out["value"], json!(11.0));
    }

    #[tokio::test]
    async fn malformed_expression_is_a_template_error() {
        let handler = ExpressionHandler::new();
        let ctx = ctx(json!({}), json!({"expression": "1 +"}));
        let err = handler.execute(&ctx).await.unwrap_err();
        assert_eq!(err.kind(), nebula_error::Kind::Template);
    }

    #[tokio::test]
    async fn missing_expression_field_is_validation_error() {
        let handler = ExpressionHandler::new();
        let ctx = ctx(json!({}), json!({}));
        let err = handler.execute(&ctx).await.unwrap_err();
        assert_eq!(err.kind(), nebula_error::Kind::Validation);
    }
}

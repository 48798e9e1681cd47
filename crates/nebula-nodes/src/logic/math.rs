//! `math` node (§4.2): evaluates an arithmetic expression from the same
//! restricted grammar as `condition`/`switch`/`expression`, rounding
//! its numeric result isn't this node's job -- callers chain `round`/
//! `floor`/`ceil` into the expression itself when needed.

use async_trait::async_trait;
use nebula_expression::ExpressionEngine;
use nebula_node::{ExecutionContext, NodeHandler, NodeMetadata, NodeOutput};
use serde_json::Value;

/// Handler for the `math` node type.
pub struct MathHandler {
    meta: NodeMetadata,
    engine: ExpressionEngine,
}

impl MathHandler {
    /// Build the handler.
    #[must_use]
    pub fn new() -> Self {
        Self {
            meta: NodeMetadata::new("math", "Math", "Evaluates an arithmetic expression"),
            engine: ExpressionEngine::new(),
        }
    }
}

impl Default for MathHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NodeHandler for MathHandler {
    fn node_type(&self) -> &str {
        "math"
    }

    fn metadata(&self) -> &NodeMetadata {
        &self.meta
    }

    async fn execute(&self, ctx: &ExecutionContext) -> nebula_error::Result<NodeOutput> {
        let source = ctx
            .config
            .get("expression")
            .and_then(Value::as_str)
            .ok_or_else(|| nebula_error::Error::validation("math requires `expression`"))?;

        let value = self
            .engine
            .evaluate(source, &ctx.input)
            .map_err(|e| nebula_error::Error::template(e.to_string()).with_node(ctx.node_id.to_string()))?;

        let result = value.as_f64().ok_or_else(|| {
            nebula_error::Error::validation("math expression did not evaluate to a number")
                .with_node(ctx.node_id.to_string())
        })?;

        let mut output = NodeOutput::new();
        output.insert("result".into(), serde_json::json!(result));
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
    async fn evaluates_builtin_function() {
        let handler = MathHandler::new();
        let ctx = ctx(json!({}), json!({"expression": "sqrt(16) + 1"}));
        let out = handler.execute(&ctx).await.unwrap();
        assert_eq!(out["result"], json!(5.0));
    }

    #[tokio::test]
    async fn non_numeric_result_is_rejected() {
        let handler = MathHandler::new();
        let ctx = ctx(json!({}), json!({"expression": "1 == 1"}));
        let err = handler.execute(&ctx).await.unwrap_err();
        assert_eq!(err.kind(), nebula_error::Kind::Validation);
    }

    #[tokio::test]
    async fn division_by_zero_surfaces_as_template_error() {
        let handler = MathHandler::new();
        let ctx = ctx(json!({}), json!({"expression": "1 / 0"}));
        let err = handler.execute(&ctx).await.unwrap_err();
        assert_eq!(err.kind(), nebula_error::Kind::Template);
    }
}

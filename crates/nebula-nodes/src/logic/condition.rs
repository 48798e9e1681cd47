//! `condition` node (§4.5): evaluates a list of comparisons and
//! activates exactly one of the `true`/`false` output ports.

use async_trait::async_trait;
use nebula_expression::ExpressionEngine;
use nebula_node::{ExecutionContext, NodeHandler, NodeMetadata, NodeOutput};
use serde_json::json;

use super::conditions::{self, CombineWith, Condition};

/// Handler for the `condition` node type.
pub struct ConditionHandler {
    meta: NodeMetadata,
    engine: ExpressionEngine,
}

impl ConditionHandler {
    /// Build the handler.
    #[must_use]
    pub fn new() -> Self {
        Self {
            meta: NodeMetadata::new(
                "condition",
                "Condition",
                "Branches on one or more comparisons",
            ),
            engine: ExpressionEngine::new(),
        }
    }
}

impl Default for ConditionHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NodeHandler for ConditionHandler {
    fn node_type(&self) -> &str {
        "condition"
    }

    fn metadata(&self) -> &NodeMetadata {
        &self.meta
    }

    async fn execute(&self, ctx: &ExecutionContext) -> nebula_error::Result<NodeOutput> {
        let raw_conditions = ctx
            .config
            .get("conditions")
            .and_then(|v| v.as_array())
            .cloned()
            .unwrap_or_default();
        let combine_with: CombineWith = ctx
            .config
            .get("combineWith")
            .cloned()
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| nebula_error::Error::validation(format!("invalid combineWith: {e}")))?
            .unwrap_or_default();

        let mut results = Vec::with_capacity(raw_conditions.len());
        for raw in &raw_conditions {
            let mut parsed: Condition = serde_json::from_value(raw.clone())
                .map_err(|e| nebula_error::Error::validation(format!("invalid condition: {e}")))?;
            parsed.left_value = conditions::resolve_operand(&parsed.left_value, &ctx.input, &self.engine);
            parsed.right_value = conditions::resolve_operand(&parsed.right_value, &ctx.input, &self.engine);
            results.push(conditions::evaluate(&parsed));
        }

        let result = conditions::combine(results, combine_with);
        let branch = if result { "true" } else { "false" };

        let mut output = NodeOutput::new();
        output.insert("result".into(), json!(result));
        output.insert("branch".into(), json!(branch));
        Ok(output)
    }
}

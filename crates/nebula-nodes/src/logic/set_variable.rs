//! `set_variable` node (§4.4 "Variable and credential resolution",
//! §8 "Variables" invariant): writes to `execCtx.variables`, observable
//! by every downstream template resolution in the same execution.

use async_trait::async_trait;
use nebula_expression::ExpressionEngine;
use nebula_node::{ExecutionContext, NodeHandler, NodeMetadata, NodeOutput};
use serde_json::json;

/// Handler for the `set_variable` node type.
pub struct SetVariableHandler {
    meta: NodeMetadata,
    engine: ExpressionEngine,
}

impl SetVariableHandler {
    /// Build the handler.
    #[must_use]
    pub fn new() -> Self {
        Self {
            meta: NodeMetadata::new("set_variable", "Set Variable", "Writes a workflow-wide variable"),
            engine: ExpressionEngine::new(),
        }
    }
}

impl Default for SetVariableHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NodeHandler for SetVariableHandler {
    fn node_type(&self) -> &str {
        "set_variable"
    }

    fn metadata(&self) -> &NodeMetadata {
        &self.meta
    }

    async fn execute(&self, ctx: &ExecutionContext) -> nebula_error::Result<NodeOutput> {
        let mut set: Vec<(String, serde_json::Value)> = Vec::new();

        if let Some(variables) = ctx.config.get("variables").and_then(serde_json::Value::as_object) {
            for (name, raw) in variables {
                set.push((name.clone(), nebula_expression::resolve(raw, &ctx.input, &self.engine)));
            }
        } else {
            let name = ctx
                .config
                .get("name")
                .and_then(serde_json::Value::as_str)
                .ok_or_else(|| nebula_error::Error::validation("set_variable requires `name`"))?;
            let raw = ctx.config.get("value").cloned().unwrap_or(serde_json::Value::Null);
            set.push((name.to_string(), nebula_expression::resolve(&raw, &ctx.input, &self.engine)));
        }

        for (name, value) in &set {
            ctx.set_variable(name.clone(), value.clone());
        }

        let mut output = NodeOutput::new();
        output.insert(
            "set".into(),
            json!(set.into_iter().collect::<serde_json::Map<_, _>>()),
        );
        Ok(output)
    }
}

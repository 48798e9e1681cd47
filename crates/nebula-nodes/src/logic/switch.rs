//! `switch` node (§4.5): either expression mode (`cases`) or rules mode
//! (`rules`); first match wins, `default` otherwise.

use async_trait::async_trait;
use nebula_expression::{as_bool, ExpressionEngine};
use nebula_node::{ExecutionContext, NodeHandler, NodeMetadata, NodeOutput};
use serde::Deserialize;
use serde_json::json;

use super::conditions::{self, CombineWith, Condition};

/// Default output activated when nothing else matches.
pub const DEFAULT_CASE: &str = "default";

#[derive(Debug, Deserialize)]
struct ExprCase {
    name: String,
    value: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct Rule {
    conditions: Vec<serde_json::Value>,
    #[serde(default)]
    #[serde(rename = "combineWith")]
    combine_with: CombineWith,
    output: String,
}

/// Handler for the `switch` node type.
pub struct SwitchHandler {
    meta: NodeMetadata,
    engine: ExpressionEngine,
}

impl SwitchHandler {
    /// Build the handler.
    #[must_use]
    pub fn new() -> Self {
        Self {
            meta: NodeMetadata::new("switch", "Switch", "Routes to the first matching case"),
            engine: ExpressionEngine::new(),
        }
    }
}

impl Default for SwitchHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NodeHandler for SwitchHandler {
    fn node_type(&self) -> &str {
        "switch"
    }

    fn metadata(&self) -> &NodeMetadata {
        &self.meta
    }

    async fn execute(&self, ctx: &ExecutionContext) -> nebula_error::Result<NodeOutput> {
        let matched = if let Some(cases) = ctx.config.get("cases").and_then(|v| v.as_array()) {
            self.match_expression_cases(cases, ctx)?
        } else if let Some(rules) = ctx.config.get("rules").and_then(|v| v.as_array()) {
            self.match_rules(rules, ctx)?
        } else {
            return Err(nebula_error::Error::validation(
                "switch requires either `cases` or `rules`",
            ));
        };

        let mut output = NodeOutput::new();
        match matched {
            Some((case, index)) => {
                output.insert("case".into(), json!(case));
                output.insert("caseIndex".into(), json!(index));
                output.insert("outputIndex".into(), json!(index));
            }
            None => {
                output.insert("case".into(), json!(DEFAULT_CASE));
                output.insert("caseIndex".into(), json!(-1));
                output.insert("outputIndex".into(), json!(-1));
            }
        }
        Ok(output)
    }
}

impl SwitchHandler {
    fn match_expression_cases(
        &self,
        cases: &[serde_json::Value],
        ctx: &ExecutionContext,
    ) -> nebula_error::Result<Option<(String, usize)>> {
        for (index, raw) in cases.iter().enumerate() {
            let case: ExprCase = serde_json::from_value(raw.clone())
                .map_err(|e| nebula_error::Error::validation(format!("invalid case: {e}")))?;
            let resolved = nebula_expression::resolve(&case.value, &ctx.input, &self.engine);
            if as_bool(&resolved) {
                return Ok(Some((case.name, index)));
            }
        }
        Ok(None)
    }

    fn match_rules(
        &self,
        rules: &[serde_json::Value],
        ctx: &ExecutionContext,
    ) -> nebula_error::Result<Option<(String, usize)>> {
        for (index, raw) in rules.iter().enumerate() {
            let rule: Rule = serde_json::from_value(raw.clone())
                .map_err(|e| nebula_error::Error::validation(format!("invalid rule: {e}")))?;
            let mut results = Vec::with_capacity(rule.conditions.len());
            for raw_cond in &rule.conditions {
                let mut cond: Condition = serde_json::from_value(raw_cond.clone())
                    .map_err(|e| nebula_error::Error::validation(format!("invalid condition: {e}")))?;
                cond.left_value = conditions::resolve_operand(&cond.left_value, &ctx.input, &self.engine);
                cond.right_value = conditions::resolve_operand(&cond.right_value, &ctx.input, &self.engine);
                results.push(conditions::evaluate(&cond));
            }
            if conditions::combine(results, rule.combine_with) {
                return Ok(Some((rule.output, index)));
            }
        }
        Ok(None)
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
    async fn expression_mode_first_match_wins() {
        let handler = SwitchHandler::new();
        let ctx = ctx(
            json!({"x": 5}),
            json!({
                "cases": [
                    {"name": "small", "value": "{{ $json.x < 10 }}"},
                    {"name": "big", "value": "{{ $json.x >= 10 }}"}
                ]
            }),
        );
        let out = handler.execute(&ctx).await.unwrap();
        assert_eq!(out["case"], json!("small"));
        assert_eq!(out["caseIndex"], json!(0));
    }

    #[tokio::test]
    async fn falls_through_to_default() {
        let handler = SwitchHandler::new();
        let ctx = ctx(
            json!({"x": 5}),
            json!({"cases": [{"name": "never", "value": "{{ $json.x > 100 }}"}]}),
        );
        let out = handler.execute(&ctx).await.unwrap();
        assert_eq!(out["case"], json!(DEFAULT_CASE));
    }

    #[tokio::test]
    async fn rules_mode_matches_named_output() {
        let handler = SwitchHandler::new();
        let ctx = ctx(
            json!({"x": 42}),
            json!({
                "rules": [
                    {
                        "conditions": [{"leftValue": "{{ $json.x }}", "operator": "greater", "rightValue": 10}],
                        "combineWith": "and",
                        "output": "highValue"
                    }
                ]
            }),
        );
        let out = handler.execute(&ctx).await.unwrap();
        assert_eq!(out["case"], json!("highValue"));
    }
}

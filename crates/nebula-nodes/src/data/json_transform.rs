//! `json_transform` node (§8 round-trip invariant: `stringify ∘ parse =
//! id`): converts between a JSON string and a parsed value.

use async_trait::async_trait;
use nebula_node::{ExecutionContext, NodeHandler, NodeMetadata, NodeOutput};
use serde_json::{json, Value};

/// Handler for the `json_transform` node type.
pub struct JsonTransformHandler {
    meta: NodeMetadata,
}

impl JsonTransformHandler {
    /// Build the handler.
    #[must_use]
    pub fn new() -> Self {
        Self {
            meta: NodeMetadata::new(
                "json_transform",
                "JSON Transform",
                "Converts between a JSON string and a parsed value",
            ),
        }
    }
}

impl Default for JsonTransformHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NodeHandler for JsonTransformHandler {
    fn node_type(&self) -> &str {
        "json_transform"
    }

    fn metadata(&self) -> &NodeMetadata {
        &self.meta
    }

    async fn execute(&self, ctx: &ExecutionContext) -> nebula_error::Result<NodeOutput> {
        let mode = ctx
            .config
            .get("mode")
            .and_then(Value::as_str)
            .ok_or_else(|| nebula_error::Error::validation("json_transform requires `mode`: parse | stringify"))?;

        let mut output = NodeOutput::new();
        match mode {
            "parse" => {
                let raw = ctx
                    .config
                    .get("value")
                    .and_then(Value::as_str)
                    .ok_or_else(|| nebula_error::Error::validation("parse mode requires a string `value`"))?;
                let parsed: Value = serde_json::from_str(raw)?;
                output.insert("value".into(), parsed);
            }
            "stringify" => {
                let value = ctx.config.get("value").cloned().unwrap_or(Value::Null);
                let pretty = ctx.config.get("pretty").and_then(Value::as_bool).unwrap_or(false);
                let text = if pretty {
                    serde_json::to_string_pretty(&value)
                } else {
                    serde_json::to_string(&value)
                }
                .map_err(nebula_error::Error::from)?;
                output.insert("value".into(), json!(text));
            }
            other => {
                return Err(nebula_error::Error::validation(format!("unknown json_transform mode: {other}")))
            }
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

    fn ctx(config: Value) -> ExecutionContext {
        ExecutionContext::new(
            ExecutionId::new(),
            WorkflowId::new("wf1"),
            WorkspaceId::new("ws1"),
            NodeId::new("n1"),
            json!({}),
            config.as_object().cloned().unwrap_or_default(),
            Arc::new(RwLock::new(serde_json::Map::new())),
        )
    }

    #[tokio::test]
    async fn stringify_then_parse_round_trips() {
        let handler = JsonTransformHandler::new();
        let value = json!({"a": 1, "b": [1, 2, 3]});

        let stringified = handler
            .execute(&ctx(json!({"mode": "stringify", "value": value})))
            .await
            .unwrap();
        let text = stringified["value"].as_str().unwrap().to_string();

        let parsed = handler
            .execute(&ctx(json!({"mode": "parse", "value": text})))
            .await
            .unwrap();
        assert_eq!(parsed["value"], value);
    }

    #[tokio::test]
    async fn parse_invalid_json_is_an_error() {
        let handler = JsonTransformHandler::new();
        let err = handler
            .execute(&ctx(json!({"mode": "parse", "value": "not json"})))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), nebula_error::Kind::Validation);
    }
}

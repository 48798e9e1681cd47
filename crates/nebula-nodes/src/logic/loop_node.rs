//! `loop` node (§4.5): produces the per-iteration item list the executor
//! fans the `body` port out over; `done` fires once with the same
//! invocation (the executor treats `body` and `done` as both eligible,
//! since fan-out happens per element rather than as a branch choice).
//!
//! Three input modes -- `forEach` (an array), `times` (a count), `while`
//! (a boolean flag) -- are mutually exclusive; `limit` bounds fan-out in
//! all three.

use async_trait::async_trait;
use nebula_expression::ExpressionEngine;
use nebula_node::{ExecutionContext, NodeHandler, NodeMetadata, NodeOutput};
use serde_json::json;

/// Handler for the `loop` node type.
pub struct LoopHandler {
    meta: NodeMetadata,
    engine: ExpressionEngine,
}

impl LoopHandler {
    /// Build the handler.
    #[must_use]
    pub fn new() -> Self {
        Self {
            meta: NodeMetadata::new("loop", "Loop", "Fans out over items, a count, or a condition"),
            engine: ExpressionEngine::new(),
        }
    }
}

impl Default for LoopHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NodeHandler for LoopHandler {
    fn node_type(&self) -> &str {
        "loop"
    }

    fn metadata(&self) -> &NodeMetadata {
        &self.meta
    }

    async fn execute(&self, ctx: &ExecutionContext) -> nebula_error::Result<NodeOutput> {
        let limit = ctx.config.get("limit").and_then(serde_json::Value::as_u64);

        let mut items: Vec<serde_json::Value> = if let Some(raw) = ctx.config.get("forEach") {
            let resolved = nebula_expression::resolve(raw, &ctx.input, &self.engine);
            resolved.as_array().cloned().ok_or_else(|| {
                nebula_error::Error::validation("loop forEach must resolve to an array")
            })?
        } else if let Some(raw) = ctx.config.get("times") {
            let resolved = nebula_expression::resolve(raw, &ctx.input, &self.engine);
            let count = resolved.as_u64().ok_or_else(|| {
                nebula_error::Error::validation("loop times must resolve to an integer")
            })?;
            (0..count).map(|n| json!(n)).collect()
        } else if let Some(raw) = ctx.config.get("while") {
            let resolved = nebula_expression::resolve(raw, &ctx.input, &self.engine);
            if nebula_expression::as_bool(&resolved) {
                vec![json!(true)]
            } else {
                Vec::new()
            }
        } else {
            return Err(nebula_error::Error::validation(
                "loop requires one of `forEach`, `times`, `while`",
            ));
        };

        let interrupted = limit.is_some_and(|limit| (limit as usize) < items.len());
        if let Some(limit) = limit {
            items.truncate(limit as usize);
        }

        let count = items.len();
        let records: Vec<serde_json::Value> = items
            .into_iter()
            .enumerate()
            .map(|(index, item)| {
                json!({
                    "item": item,
                    "index": index,
                    "first": index == 0,
                    "last": index + 1 == count,
                })
            })
            .collect();

        let mut output = NodeOutput::new();
        output.insert("items".into(), json!(records));
        output.insert("count".into(), json!(count));
        output.insert("interrupted".into(), json!(interrupted));
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
    async fn for_each_produces_indexed_records() {
        let handler = LoopHandler::new();
        let ctx = ctx(
            json!({"items": [1, 2, 3]}),
            json!({"forEach": "{{ $json.items }}"}),
        );
        let out = handler.execute(&ctx).await.unwrap();
        assert_eq!(out["count"], json!(3));
        let items = out["items"].as_array().unwrap();
        assert_eq!(items[0]["item"], json!(1));
        assert_eq!(items[0]["first"], json!(true));
        assert_eq!(items[2]["last"], json!(true));
    }

    #[tokio::test]
    async fn limit_truncates_and_marks_interrupted() {
        let handler = LoopHandler::new();
        let ctx = ctx(
            json!({"items": [1, 2, 3, 4]}),
            json!({"forEach": "{{ $json.items }}", "limit": 2}),
        );
        let out = handler.execute(&ctx).await.unwrap();
        assert_eq!(out["count"], json!(2));
        assert_eq!(out["interrupted"], json!(true));
    }

    #[tokio::test]
    async fn times_produces_integer_sequence() {
        let handler = LoopHandler::new();
        let ctx = ctx(json!({}), json!({"times": 3}));
        let out = handler.execute(&ctx).await.unwrap();
        let items = out["items"].as_array().unwrap();
        assert_eq!(items[1]["item"], json!(1));
    }
}

//! `merge` node (§4.5). `wait` mode's actual gating (deferring
//! activation until every declared predecessor has produced output) is
//! the executor's job, driven from the workflow graph's incoming-edge
//! count -- by the time this handler runs, `ctx.input` already holds
//! every predecessor's output keyed by source node id, so `wait`
//! reduces to the same merge-by-key behaviour as `combine`.

use async_trait::async_trait;
use nebula_node::{ExecutionContext, NodeHandler, NodeMetadata, NodeOutput};
use serde::Deserialize;
use serde_json::{json, Value};

const RESERVED_KEYS: &[&str] = &["$json", "$input", "variables"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
enum Mode {
    Append,
    Combine,
    Multiplex,
    ChooseBranch,
    Wait,
}

/// Handler for the `merge` node type.
pub struct MergeHandler {
    meta: NodeMetadata,
}

impl MergeHandler {
    /// Build the handler.
    #[must_use]
    pub fn new() -> Self {
        Self {
            meta: NodeMetadata::new("merge", "Merge", "Combines multiple upstream inputs"),
        }
    }
}

impl Default for MergeHandler {
    fn default() -> Self {
        Self::new()
    }
}

fn predecessor_values(input: &Value) -> Vec<(String, Value)> {
    let Some(map) = input.as_object() else {
        return Vec::new();
    };
    map.iter()
        .filter(|(k, _)| !RESERVED_KEYS.contains(&k.as_str()))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

#[async_trait]
impl NodeHandler for MergeHandler {
    fn node_type(&self) -> &str {
        "merge"
    }

    fn metadata(&self) -> &NodeMetadata {
        &self.meta
    }

    async fn execute(&self, ctx: &ExecutionContext) -> nebula_error::Result<NodeOutput> {
        let mode: Mode = ctx
            .config
            .get("mode")
            .cloned()
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| nebula_error::Error::validation(format!("invalid merge mode: {e}")))?
            .unwrap_or(Mode::Combine);

        let predecessors = predecessor_values(&ctx.input);
        let mut output = NodeOutput::new();

        match mode {
            Mode::Append => {
                let items: Vec<Value> = predecessors.into_iter().map(|(_, v)| v).collect();
                output.insert("count".into(), json!(items.len()));
                output.insert("items".into(), json!(items));
            }
            Mode::Combine | Mode::Wait => {
                let mut merged = serde_json::Map::new();
                for (_, value) in predecessors {
                    if let Value::Object(map) = value {
                        merged.extend(map);
                    }
                }
                output = merged;
            }
            Mode::Multiplex => {
                let arrays: Vec<Vec<Value>> = predecessors
                    .into_iter()
                    .map(|(_, v)| v.as_array().cloned().unwrap_or_default())
                    .collect();
                let len = arrays.iter().map(Vec::len).min().unwrap_or(0);
                let tuples: Vec<Value> = (0..len)
                    .map(|i| json!(arrays.iter().map(|a| a[i].clone()).collect::<Vec<_>>()))
                    .collect();
                output.insert("count".into(), json!(tuples.len()));
                output.insert("items".into(), json!(tuples));
            }
            Mode::ChooseBranch => {
                let which = ctx
                    .config
                    .get("chooseBranch")
                    .and_then(Value::as_str)
                    .unwrap_or("first");
                let chosen = match which {
                    "last" => predecessors.last().map(|(_, v)| v.clone()),
                    "first" => predecessors.first().map(|(_, v)| v.clone()),
                    specified => predecessors
                        .iter()
                        .find(|(k, _)| k == specified)
                        .map(|(_, v)| v.clone()),
                };
                if let Some(Value::Object(map)) = chosen {
                    output = map;
                }
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
    async fn combine_merges_predecessor_objects() {
        let handler = MergeHandler::new();
        let ctx = ctx(
            json!({"a": {"x": 1}, "b": {"y": 2}}),
            json!({"mode": "combine"}),
        );
        let out = handler.execute(&ctx).await.unwrap();
        assert_eq!(out["x"], json!(1));
        assert_eq!(out["y"], json!(2));
    }

    #[tokio::test]
    async fn append_collects_into_items() {
        let handler = MergeHandler::new();
        let ctx = ctx(
            json!({"a": {"x": 1}, "b": {"y": 2}}),
            json!({"mode": "append"}),
        );
        let out = handler.execute(&ctx).await.unwrap();
        assert_eq!(out["count"], json!(2));
    }

    #[tokio::test]
    async fn choose_branch_selects_named_predecessor() {
        let handler = MergeHandler::new();
        let ctx = ctx(
            json!({"a": {"x": 1}, "b": {"y": 2}}),
            json!({"mode": "chooseBranch", "chooseBranch": "b"}),
        );
        let out = handler.execute(&ctx).await.unwrap();
        assert_eq!(out["y"], json!(2));
        assert!(out.get("x").is_none());
    }
}

//! Input assembly (§4.4 `assembleInput`).
//!
//! Before invoking a node the executor collects the outputs of every
//! upstream node with an edge into it, keyed by the source node's id,
//! and layers in the reserved scope keys every template and expression
//! can reach: `$json` (the "primary" incoming edge's output -- the
//! first one declared on the workflow, per
//! [`nebula_core::Workflow::incoming`]), `$input` (the execution's
//! original trigger input, constant for the whole run), `variables`
//! (the live workflow-wide scratchpad), and `$error` (present only
//! when the executor is routing a continued/branched failure
//! downstream, per §7 point 2 -- read directly by `retry`,
//! `try_catch`, `fallback`, and `continue_on_fail`).

use nebula_core::Workflow;
use serde_json::Value;

/// The reserved keys every assembled input may carry regardless of the
/// node's position in the graph; a predecessor node id equal to one of
/// these would be ambiguous, so the graph loader rejects it (shared
/// with `nebula-nodes`' own `RESERVED_KEYS` constant, which omits
/// `$error` since it never collides with a predecessor's output -- it
/// is injected by the executor, not looked up by node id).
pub const RESERVED_KEYS: [&str; 4] = ["$json", "$input", "variables", "$error"];

/// Build the `input` value passed to
/// [`ExecutionContext`](nebula_node::ExecutionContext) for `node_id`.
///
/// `node_outputs` looks up a previously recorded node's output by its
/// graph id (already stripped of any `#<iter>` suffix for loop bodies
/// by the caller -- see [`crate::executor`]). `error` is `Some` only
/// when the executor is carrying a failed predecessor's error forward
/// under `onError: continue` or `onError: branch`.
#[must_use]
pub fn assemble_input(
    workflow: &Workflow,
    node_id: &str,
    node_outputs: impl Fn(&str) -> Option<Value>,
    input_data: &Value,
    variables: &serde_json::Map<String, Value>,
    error: Option<Value>,
) -> Value {
    let mut scope = serde_json::Map::new();
    let mut primary: Option<Value> = None;

    for (i, edge) in workflow.incoming(node_id).enumerate() {
        let Some(output) = node_outputs(&edge.from) else {
            continue;
        };
        if i == 0 {
            primary = Some(output.clone());
        }
        scope.insert(edge.from.clone(), output);
    }

    scope.insert("$json".to_string(), primary.unwrap_or(Value::Null));
    scope.insert("$input".to_string(), input_data.clone());
    scope.insert("variables".to_string(), Value::Object(variables.clone()));
    if let Some(error) = error {
        scope.insert("$error".to_string(), error);
    }

    Value::Object(scope)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nebula_core::{Edge, Node, WorkflowId, MAIN_PORT};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn node(id: &str) -> Node {
        Node {
            id: id.to_string(),
            node_type: "noop".into(),
            config: serde_json::Map::new(),
            on_error: None,
            retry_policy: None,
            timeout: None,
            extra: BTreeMap::new(),
        }
    }

    fn workflow() -> Workflow {
        Workflow {
            id: WorkflowId::new("wf1"),
            name: "t".into(),
            nodes: vec![node("a"), node("b"), node("c")],
            edges: vec![
                Edge {
                    from: "a".into(),
                    from_port: MAIN_PORT.into(),
                    to: "c".into(),
                },
                Edge {
                    from: "b".into(),
                    from_port: MAIN_PORT.into(),
                    to: "c".into(),
                },
            ],
        }
    }

    #[test]
    fn first_declared_incoming_edge_becomes_json() {
        let wf = workflow();
        let outputs = |id: &str| match id {
            "a" => Some(json!({"x": 1})),
            "b" => Some(json!({"y": 2})),
            _ => None,
        };
        let input = assemble_input(
            &wf,
            "c",
            outputs,
            &json!({"trigger": true}),
            &serde_json::Map::new(),
            None,
        );
        assert_eq!(input["$json"], json!({"x": 1}));
        assert_eq!(input["a"], json!({"x": 1}));
        assert_eq!(input["b"], json!({"y": 2}));
        assert_eq!(input["$input"], json!({"trigger": true}));
        assert!(input.get("$error").is_none());
    }

    #[test]
    fn trigger_node_gets_null_json_and_empty_predecessors() {
        let wf = workflow();
        let input = assemble_input(&wf, "a", |_| None, &json!({}), &serde_json::Map::new(), None);
        assert_eq!(input["$json"], Value::Null);
    }

    #[test]
    fn variables_snapshot_is_embedded() {
        let wf = workflow();
        let mut vars = serde_json::Map::new();
        vars.insert("count".into(), json!(3));
        let input = assemble_input(&wf, "a", |_| None, &json!({}), &vars, None);
        assert_eq!(input["variables"]["count"], json!(3));
    }

    #[test]
    fn error_is_injected_at_top_level_when_present() {
        let wf = workflow();
        let input = assemble_input(
            &wf,
            "a",
            |_| None,
            &json!({}),
            &serde_json::Map::new(),
            Some(json!({"message": "boom"})),
        );
        assert_eq!(input["$error"]["message"], json!("boom"));
    }
}

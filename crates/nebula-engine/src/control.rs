//! Branch/fan-out dispatch (§4.4 "Branch selection", §9 design note:
//! "avoid encoding branching as boolean flags on outputs; return a
//! small sum-type the executor honours uniformly").
//!
//! Control-flow handlers do not stop execution directly -- their output
//! mapping carries branch metadata ([`ConditionHandler`]'s `branch`,
//! [`SwitchHandler`]'s `case`, [`LoopHandler`]'s `items`, …) that
//! [`control_signal`] reads to decide which outgoing edges activate.
//! Every other node type activates the single `main` port.

use nebula_core::MAIN_PORT;
use serde_json::Value;

/// One loop iteration's bound item, paired with its 0-based index for
/// the `<nodeId>#<iter>` node-result key (§5).
#[derive(Debug, Clone)]
pub struct LoopIteration {
    /// Index into the loop's item list.
    pub index: usize,
    /// The full per-iteration record (`{item, index, first, last}`)
    /// available to downstream templates keyed by the loop node's id.
    pub record: Value,
}

/// What a completed node's output tells the executor to do next.
#[derive(Debug, Clone, Default)]
pub struct ControlSignal {
    /// Output ports to activate normally: schedule every outgoing edge
    /// whose `from_port` is one of these.
    pub ports: Vec<String>,
    /// If set, fan out the named port: schedule every outgoing edge
    /// whose `from_port` equals it once per [`LoopIteration`], with
    /// `$json` bound to that iteration's raw item.
    pub fan_out: Option<(String, Vec<LoopIteration>)>,
}

impl ControlSignal {
    fn single(port: impl Into<String>) -> Self {
        Self {
            ports: vec![port.into()],
            fan_out: None,
        }
    }

    /// The default signal for any node type without special branch
    /// semantics: activate `main`.
    #[must_use]
    pub fn main_port() -> Self {
        Self::single(MAIN_PORT)
    }
}

/// Compute the [`ControlSignal`] for a completed node, given its
/// registry type and output.
#[must_use]
pub fn control_signal(node_type: &str, output: &serde_json::Map<String, Value>) -> ControlSignal {
    match node_type {
        "condition" => {
            let branch = output.get("branch").and_then(Value::as_str).unwrap_or("false");
            ControlSignal::single(branch)
        }
        "switch" => {
            let case = output.get("case").and_then(Value::as_str).unwrap_or("default");
            ControlSignal::single(case)
        }
        "try_catch" => {
            let branch = output.get("branch").and_then(Value::as_str).unwrap_or("success");
            ControlSignal::single(branch)
        }
        "loop" => {
            let items = output
                .get("items")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default();
            let iterations = items
                .into_iter()
                .enumerate()
                .map(|(index, record)| LoopIteration { index, record })
                .collect();
            ControlSignal {
                ports: vec!["done".to_string()],
                fan_out: Some(("body".to_string(), iterations)),
            }
        }
        _ => ControlSignal::main_port(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(v: Value) -> serde_json::Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn condition_activates_named_branch() {
        let sig = control_signal("condition", &obj(json!({"branch": "true"})));
        assert_eq!(sig.ports, vec!["true"]);
        assert!(sig.fan_out.is_none());
    }

    #[test]
    fn switch_activates_case_name() {
        let sig = control_signal("switch", &obj(json!({"case": "highValue"})));
        assert_eq!(sig.ports, vec!["highValue"]);
    }

    #[test]
    fn loop_fans_out_body_and_activates_done() {
        let sig = control_signal(
            "loop",
            &obj(json!({"items": [{"item": 1, "index": 0}, {"item": 2, "index": 1}]})),
        );
        assert_eq!(sig.ports, vec!["done"]);
        let (port, iters) = sig.fan_out.unwrap();
        assert_eq!(port, "body");
        assert_eq!(iters.len(), 2);
        assert_eq!(iters[1].index, 1);
    }

    #[test]
    fn other_nodes_activate_main() {
        let sig = control_signal("filter", &obj(json!({"items": []})));
        assert_eq!(sig.ports, vec![MAIN_PORT]);
    }
}

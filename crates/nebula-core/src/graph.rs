//! Workflow graph wire format (§3, §6).
//!
//! `Workflow` is the JSON shape consumed from `WorkflowService`:
//! `{ id, name, nodes: [...], edges: [...] }`. Unknown fields on `Node`
//! are preserved via `#[serde(flatten)]` into `extra` so a workflow
//! definition produced by a newer version of the authoring UI does not
//! lose data round-tripping through this type.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::id::WorkflowId;

/// Default output port name used when an edge does not specify one.
pub const MAIN_PORT: &str = "main";

fn default_port() -> String {
    MAIN_PORT.to_string()
}

/// A workflow definition: a directed graph of nodes connected by edges.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workflow {
    /// Workflow identifier.
    pub id: WorkflowId,
    /// Human-readable name.
    pub name: String,
    /// Nodes in the graph, keyed by their declaration order.
    pub nodes: Vec<Node>,
    /// Edges connecting node ports.
    pub edges: Vec<Edge>,
}

impl Workflow {
    /// Look up a node by id.
    #[must_use]
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// All edges whose `from` is the given node id.
    pub fn outgoing(&self, node_id: &str) -> impl Iterator<Item = &Edge> {
        self.edges.iter().filter(move |e| e.from == node_id)
    }

    /// All edges whose `to` is the given node id, in declaration order
    /// (declaration order establishes the "primary" incoming edge used
    /// for `$json`, per §4.4 `assembleInput`).
    pub fn incoming(&self, node_id: &str) -> impl Iterator<Item = &Edge> {
        self.edges.iter().filter(move |e| e.to == node_id)
    }

    /// Validate the schema invariant from §8: every edge endpoint exists
    /// among `nodes`.
    pub fn validate_schema(&self) -> Result<(), String> {
        for edge in &self.edges {
            if self.node(&edge.from).is_none() {
                return Err(format!("edge references unknown source node {}", edge.from));
            }
            if self.node(&edge.to).is_none() {
                return Err(format!("edge references unknown target node {}", edge.to));
            }
        }
        Ok(())
    }
}

/// A single node in the graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Unique id within the workflow.
    pub id: String,
    /// Registry key, e.g. `"condition"`, `"http.request"`.
    #[serde(rename = "type")]
    pub node_type: String,
    /// Free-form config; template tokens are resolved against the
    /// assembled input before the handler is invoked.
    #[serde(default)]
    pub config: serde_json::Map<String, serde_json::Value>,
    /// Error handling policy; defaults to `stop`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_error: Option<OnErrorPolicy>,
    /// Retry policy consulted when `on_error == Retry`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_policy: Option<RetryPolicy>,
    /// Per-node deadline in milliseconds; falls back to the executor's
    /// default when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
    /// Any fields not recognised above -- preserved, never dropped.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// Per-node error handling policy (§4.4, §7).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "policy")]
pub enum OnErrorPolicy {
    /// The execution fails.
    Stop,
    /// Treated as success with partial output; `$error` is set downstream.
    Continue,
    /// Re-enqueue with backoff per `retry_policy`.
    Retry,
    /// Activate the named error port and feed it `$error`.
    Branch {
        /// The port to activate on error.
        port: String,
    },
}

impl Default for OnErrorPolicy {
    fn default() -> Self {
        Self::Stop
    }
}

/// Backoff configuration for the `retry` `onError` policy.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Maximum retry attempts (total attempts = `max_retries + 1`).
    pub max_retries: u32,
    /// Delay before the first retry, in milliseconds.
    pub initial_delay_ms: u64,
    /// Upper bound on any single delay, in milliseconds.
    pub max_delay_ms: u64,
    /// Backoff shape.
    #[serde(default)]
    pub backoff: BackoffType,
}

/// Backoff growth shape, shared by the executor's retry policy and the
/// `retry` control-flow node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffType {
    /// Constant delay every attempt.
    Fixed,
    /// Delay grows linearly with attempt number.
    Linear,
    /// Delay doubles every attempt.
    #[default]
    Exponential,
}

impl BackoffType {
    /// Compute the delay for a given 1-based attempt number, bounded by
    /// `max_delay_ms`.
    #[must_use]
    pub fn delay_ms(self, attempt: u32, initial_delay_ms: u64, max_delay_ms: u64) -> u64 {
        let raw = match self {
            Self::Fixed => initial_delay_ms,
            Self::Linear => initial_delay_ms.saturating_mul(u64::from(attempt)),
            Self::Exponential => {
                let exponent = attempt.saturating_sub(1).min(32);
                initial_delay_ms.saturating_mul(1u64 << exponent)
            }
        };
        raw.min(max_delay_ms)
    }
}

/// A directed edge from one node's output port to another node's input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    /// Source node id.
    pub from: String,
    /// Source output port; defaults to `"main"`.
    #[serde(default = "default_port")]
    pub from_port: String,
    /// Target node id.
    pub to: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> Workflow {
        Workflow {
            id: WorkflowId::new("wf1"),
            name: "sample".into(),
            nodes: vec![
                Node {
                    id: "a".into(),
                    node_type: "manual".into(),
                    config: serde_json::Map::new(),
                    on_error: None,
                    retry_policy: None,
                    timeout: None,
                    extra: BTreeMap::new(),
                },
                Node {
                    id: "b".into(),
                    node_type: "condition".into(),
                    config: serde_json::Map::new(),
                    on_error: None,
                    retry_policy: None,
                    timeout: None,
                    extra: BTreeMap::new(),
                },
            ],
            edges: vec![Edge {
                from: "a".into(),
                from_port: MAIN_PORT.into(),
                to: "b".into(),
            }],
        }
    }

    #[test]
    fn validate_schema_accepts_well_formed_graph() {
        assert!(sample().validate_schema().is_ok());
    }

    #[test]
    fn validate_schema_rejects_dangling_edge() {
        let mut wf = sample();
        wf.edges.push(Edge {
            from: "a".into(),
            from_port: MAIN_PORT.into(),
            to: "missing".into(),
        });
        assert!(wf.validate_schema().is_err());
    }

    #[test]
    fn outgoing_finds_edges_by_source() {
        let wf = sample();
        let out: Vec<_> = wf.outgoing("a").collect();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].to, "b");
    }

    #[test]
    fn edge_from_port_defaults_to_main() {
        let json = serde_json::json!({"from": "a", "to": "b"});
        let edge: Edge = serde_json::from_value(json).unwrap();
        assert_eq!(edge.from_port, MAIN_PORT);
    }

    #[test]
    fn unknown_node_fields_are_preserved() {
        let json = serde_json::json!({
            "id": "a",
            "type": "manual",
            "futureField": 42,
        });
        let node: Node = serde_json::from_value(json).unwrap();
        assert_eq!(
            node.extra.get("futureField"),
            Some(&serde_json::json!(42))
        );
    }

    #[test]
    fn exponential_backoff_doubles_and_caps() {
        let b = BackoffType::Exponential;
        assert_eq!(b.delay_ms(1, 10, 1_000), 10);
        assert_eq!(b.delay_ms(2, 10, 1_000), 20);
        assert_eq!(b.delay_ms(3, 10, 1_000), 40);
        assert_eq!(b.delay_ms(20, 10, 1_000), 1_000);
    }

    #[test]
    fn fixed_backoff_is_constant() {
        let b = BackoffType::Fixed;
        assert_eq!(b.delay_ms(1, 50, 1_000), 50);
        assert_eq!(b.delay_ms(5, 50, 1_000), 50);
    }

    #[test]
    fn linear_backoff_scales_with_attempt() {
        let b = BackoffType::Linear;
        assert_eq!(b.delay_ms(1, 10, 1_000), 10);
        assert_eq!(b.delay_ms(3, 10, 1_000), 30);
    }
}

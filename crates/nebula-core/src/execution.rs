//! Execution data model (§3).
//!
//! `Execution` is the durable record of one workflow run: status,
//! timestamps, trigger payload, the rolling `node_results` map, and the
//! workflow-wide `variables` scratchpad. `ExecutionService` (in
//! `nebula-ports`) persists transitions of this type; the executor in
//! `nebula-engine` owns the in-memory copy for the duration of a run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::{ExecutionId, WorkflowId, WorkspaceId};

/// Execution lifecycle state. `queued -> running -> (succeeded | failed
/// | cancelled)`, terminal states never revert (§3, §4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// Created, not yet picked up by a worker.
    Queued,
    /// At least one node has started.
    Running,
    /// Every reachable node completed without a fatal error.
    Succeeded,
    /// A fatal error, or a `stop`-policy node error, ended the run.
    Failed,
    /// Cancelled externally before completion.
    Cancelled,
}

impl Status {
    /// Whether this status is terminal (no further node will run).
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Cancelled)
    }
}

/// Result recorded for a single node invocation. For iterative
/// (`loop`-driven) nodes, the id under which this is stored in
/// `Execution::node_results` has `#<iter>` appended per §5.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeResult {
    /// `queued | running | succeeded | failed | cancelled`, scoped to this
    /// one node invocation.
    pub status: Status,
    /// The node's output mapping, if it completed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<serde_json::Value>,
    /// The error, if it failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<nebula_error::Error>,
    /// Wall-clock duration of the invocation.
    pub duration_ms: u64,
}

/// The durable record of one workflow execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Execution {
    /// Unique id for this run.
    pub id: ExecutionId,
    /// The workflow being run.
    pub workflow_id: WorkflowId,
    /// The owning workspace.
    pub workspace_id: WorkspaceId,
    /// Current lifecycle status.
    pub status: Status,
    /// When the execution was created.
    pub started_at: Option<DateTime<Utc>>,
    /// When the execution reached a terminal status.
    pub finished_at: Option<DateTime<Utc>>,
    /// Node type of the trigger that started this run.
    pub trigger_type: String,
    /// Raw payload the trigger fired with.
    pub trigger_data: serde_json::Value,
    /// The input data bound to `$input` for the whole run.
    pub input_data: serde_json::Value,
    /// Rolling node id -> result map, appended in causal order and never
    /// mutated after write (§3 Ownership & lifecycle).
    pub node_results: indexmap::IndexMap<String, NodeResult>,
    /// Workflow-wide mutable scratchpad written by `set_variable`.
    pub variables: serde_json::Map<String, serde_json::Value>,
    /// Monotonically increasing counter, bumped once per node completion.
    pub progress: u64,
}

impl Execution {
    /// Create a freshly queued execution for a trigger firing.
    #[must_use]
    pub fn new(
        workflow_id: WorkflowId,
        workspace_id: WorkspaceId,
        trigger_type: impl Into<String>,
        trigger_data: serde_json::Value,
        input_data: serde_json::Value,
    ) -> Self {
        Self {
            id: ExecutionId::new(),
            workflow_id,
            workspace_id,
            status: Status::Queued,
            started_at: None,
            finished_at: None,
            trigger_type: trigger_type.into(),
            trigger_data,
            input_data,
            node_results: indexmap::IndexMap::new(),
            variables: serde_json::Map::new(),
            progress: 0,
        }
    }

    /// Record a node's result and bump `progress`. Overwrites any
    /// previous entry under the same key (last-writer-wins per §5).
    pub fn record_node_result(&mut self, key: impl Into<String>, result: NodeResult) {
        self.node_results.insert(key.into(), result);
        self.progress += 1;
    }

    /// Transition to `running`, stamping `started_at` on first call.
    pub fn mark_running(&mut self) {
        if self.started_at.is_none() {
            self.started_at = Some(Utc::now());
        }
        self.status = Status::Running;
    }

    /// Transition to a terminal status, stamping `finished_at`.
    pub fn mark_terminal(&mut self, status: Status) {
        debug_assert!(status.is_terminal());
        self.status = status;
        self.finished_at = Some(Utc::now());
    }
}

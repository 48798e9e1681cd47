//! Errors the executor itself can raise, distinct from a node handler's
//! own [`nebula_error::Error`] (§7).

use nebula_core::ExecutionId;
use nebula_ports::PortsError;

/// Failure raised by [`crate::Executor::run`] before or around node
/// invocation -- as opposed to a node handler's own error, which is
/// always wrapped in [`nebula_error::Error`] and routed through the
/// node's `onError` policy (§7).
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// No execution exists with the given id.
    #[error("execution not found: {0}")]
    ExecutionNotFound(ExecutionId),

    /// The execution's workflow could not be loaded.
    #[error("workflow not found: {0}")]
    WorkflowNotFound(String),

    /// The workflow graph failed `validate_schema` (§8 "Schema"
    /// invariant).
    #[error("invalid workflow graph: {0}")]
    InvalidGraph(String),

    /// The execution's `trigger_type` names no node in the graph
    /// (§4.4 "Identify the starting node").
    #[error("no trigger node of type `{0}` in workflow")]
    TriggerNotFound(String),

    /// A node's `type` has no registered handler (§6 "Unknown node
    /// types fail the execution with `unknown_node_type`").
    #[error("unknown_node_type: {0}")]
    UnknownNodeType(String),

    /// A port operation (persistence, queueing, …) failed.
    #[error(transparent)]
    Ports(#[from] PortsError),
}

impl EngineError {
    /// Render this as a node-less [`nebula_error::Error`] of kind
    /// `fatal`, the representation stored on the execution record for
    /// errors that never reach a specific node (§7 point 4: these
    /// always bypass `onError`).
    #[must_use]
    pub fn into_fatal(self) -> nebula_error::Error {
        nebula_error::Error::fatal(self.to_string())
    }
}

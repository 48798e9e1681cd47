//! Execution persistence port (§6, "ExecutionService (consumed)").
//!
//! CRUD on the durable [`Execution`] record, plus the append operation
//! the executor calls once per completed node. Unlike the teacher's
//! `ExecutionRepo`, this port carries no lease/journal concerns -- this
//! spec has exactly one worker driving a given execution at a time by
//! construction (§4.6), so there is nothing to arbitrate.

use async_trait::async_trait;
use nebula_core::{Execution, ExecutionId, ExecutionStatus, NodeResult};

use crate::error::PortsError;

/// Persistence interface for workflow executions.
#[async_trait]
pub trait ExecutionService: Send + Sync {
    /// Persist a freshly created execution, returning its id.
    async fn create(&self, execution: Execution) -> Result<ExecutionId, PortsError>;

    /// Fetch an execution by id.
    async fn get(&self, id: &ExecutionId) -> Result<Option<Execution>, PortsError>;

    /// Transition `id` to `status`, stamping timestamps as
    /// [`Execution::mark_running`]/[`Execution::mark_terminal`] would.
    async fn set_status(&self, id: &ExecutionId, status: ExecutionStatus) -> Result<(), PortsError>;

    /// Append one node's result and bump `progress`.
    async fn append_node_result(
        &self,
        id: &ExecutionId,
        node_key: String,
        result: NodeResult,
    ) -> Result<(), PortsError>;

    /// Merge `patch` into the execution's `variables` map.
    async fn merge_variables(
        &self,
        id: &ExecutionId,
        patch: serde_json::Map<String, serde_json::Value>,
    ) -> Result<(), PortsError>;
}

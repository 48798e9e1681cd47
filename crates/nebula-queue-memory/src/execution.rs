//! In-memory [`ExecutionService`] driver (§6), a `DashMap<ExecutionId,
//! Execution>` standing in for the teacher's durable execution
//! repository. Suitable for the worker binary's default configuration
//! and for engine/subworkflow tests; a production deployment swaps this
//! for a real datastore behind the same trait.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use nebula_core::{Execution, ExecutionId, ExecutionStatus, NodeResult};
use nebula_ports::{ExecutionService, PortsError};

/// In-memory execution store.
#[derive(Clone, Default)]
pub struct MemoryExecutionService {
    executions: Arc<DashMap<ExecutionId, Execution>>,
}

impl MemoryExecutionService {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ExecutionService for MemoryExecutionService {
    async fn create(&self, execution: Execution) -> Result<ExecutionId, PortsError> {
        let id = execution.id;
        self.executions.insert(id, execution);
        Ok(id)
    }

    async fn get(&self, id: &ExecutionId) -> Result<Option<Execution>, PortsError> {
        Ok(self.executions.get(id).map(|entry| entry.value().clone()))
    }

    async fn set_status(&self, id: &ExecutionId, status: ExecutionStatus) -> Result<(), PortsError> {
        let mut entry = self
            .executions
            .get_mut(id)
            .ok_or_else(|| PortsError::not_found("Execution", id.to_string()))?;
        if status.is_terminal() {
            entry.mark_terminal(status);
        } else if status == ExecutionStatus::Running {
            entry.mark_running();
        } else {
            entry.status = status;
        }
        Ok(())
    }

    async fn append_node_result(
        &self,
        id: &ExecutionId,
        node_key: String,
        result: NodeResult,
    ) -> Result<(), PortsError> {
        let mut entry = self
            .executions
            .get_mut(id)
            .ok_or_else(|| PortsError::not_found("Execution", id.to_string()))?;
        entry.record_node_result(node_key, result);
        Ok(())
    }

    async fn merge_variables(
        &self,
        id: &ExecutionId,
        patch: serde_json::Map<String, serde_json::Value>,
    ) -> Result<(), PortsError> {
        let mut entry = self
            .executions
            .get_mut(id)
            .ok_or_else(|| PortsError::not_found("Execution", id.to_string()))?;
        entry.variables.extend(patch);
        Ok(())
    }
}

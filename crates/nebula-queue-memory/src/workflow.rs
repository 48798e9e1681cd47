//! In-memory [`WorkflowService`] driver (§6): a `DashMap<WorkflowId,
//! Workflow>` loaded once (e.g. from a fixture file or authoring-API
//! snapshot) and served read-only thereafter, mirroring §3's statement
//! that "the registry is process-wide, populated once at startup, and
//! read-only thereafter" applied here to workflow definitions rather
//! than node handlers.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use nebula_core::{Workflow, WorkflowId};
use nebula_ports::{PortsError, WorkflowService};

/// In-memory workflow definition store.
#[derive(Clone, Default)]
pub struct MemoryWorkflowService {
    workflows: Arc<DashMap<WorkflowId, Workflow>>,
}

impl MemoryWorkflowService {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a workflow definition.
    pub fn put(&self, workflow: Workflow) {
        self.workflows.insert(workflow.id.clone(), workflow);
    }
}

#[async_trait]
impl WorkflowService for MemoryWorkflowService {
    async fn get(&self, id: &WorkflowId) -> Result<Option<Workflow>, PortsError> {
        Ok(self.workflows.get(id).map(|entry| entry.value().clone()))
    }
}

//! Workflow definition port (§6, "WorkflowService (consumed)").
//!
//! Defines the read interface the executor uses to fetch the graph it is
//! driving. Returns strongly-typed [`nebula_core::Workflow`] rather than
//! raw JSON, so the executor never re-validates the wire shape -- any
//! parse failure happens at the port boundary and surfaces as
//! [`PortsError::Serialization`].

use async_trait::async_trait;
use nebula_core::{Workflow, WorkflowId};

use crate::error::PortsError;

/// Read access to workflow definitions.
///
/// Implementations must be `Send + Sync` so the trait object can be
/// shared across worker tasks.
#[async_trait]
pub trait WorkflowService: Send + Sync {
    /// Fetch a workflow definition by id. `Ok(None)` means no such
    /// workflow exists; any other failure is a [`PortsError`].
    async fn get(&self, id: &WorkflowId) -> Result<Option<Workflow>, PortsError>;
}

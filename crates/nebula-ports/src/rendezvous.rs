//! Sub-workflow rendezvous port (§4.6, §6).
//!
//! A parent execution that calls a sub-workflow enqueues a child
//! execution and then waits for its result without blocking a worker
//! thread: it publishes a correlation id to watch and the worker picks
//! up a fresh job once that id's result appears. `Rendezvous` is the
//! narrow mailbox abstraction that makes the wait observable across
//! worker processes.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::PortsError;

/// The result a child execution reports back to its parent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RendezvousResult {
    /// `true` if the child execution succeeded.
    pub succeeded: bool,
    /// The child's output data, if it succeeded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<serde_json::Value>,
    /// The child's error, if it failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<nebula_error::Error>,
}

/// Mailbox for a single sub-workflow call, keyed by a caller-chosen
/// correlation id (§4.6 uses the child `ExecutionId` as the key).
#[async_trait]
pub trait Rendezvous: Send + Sync {
    /// Publish the result for `correlation_id`. Called once by the
    /// worker that finishes driving the child execution.
    async fn publish_result(
        &self,
        correlation_id: &str,
        result: RendezvousResult,
    ) -> Result<(), PortsError>;

    /// Poll for a published result without consuming it. `None` means
    /// the child has not finished yet.
    async fn await_result(
        &self,
        correlation_id: &str,
    ) -> Result<Option<RendezvousResult>, PortsError>;

    /// Remove a published result once the parent has consumed it.
    async fn delete(&self, correlation_id: &str) -> Result<(), PortsError>;
}

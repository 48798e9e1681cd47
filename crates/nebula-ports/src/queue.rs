//! Job queue port (§6, "JobQueue (consumed)").
//!
//! Generalizes the teacher's `TaskQueue` from a bare `serde_json::Value`
//! payload to the closed [`JobPayload`] enum this spec actually needs:
//! workflow-execution dispatch plus the notification/webhook-delivery/
//! email jobs a node's side effects enqueue (§6 calls these
//! "out of core scope" for execution but still part of the wire
//! contract a worker needs to route on).

use std::time::Duration;

use async_trait::async_trait;
use nebula_core::{ExecutionId, WorkflowId, WorkspaceId};
use serde::{Deserialize, Serialize};

use crate::error::PortsError;

/// A unit of work a worker dequeues and executes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum JobPayload {
    /// Drive (or resume) one workflow execution to completion or a wait
    /// point.
    WorkflowExecution {
        /// The execution to drive.
        execution_id: ExecutionId,
        /// The workflow it belongs to, denormalized so a worker can
        /// fetch the definition without a round trip through
        /// [`ExecutionService`](crate::execution::ExecutionService) first.
        workflow_id: WorkflowId,
        /// Owning workspace.
        workspace_id: WorkspaceId,
    },
    /// Deliver a user-facing notification (push, in-app, etc).
    Notification {
        /// Opaque notification payload, interpreted by the notification
        /// driver.
        payload: serde_json::Value,
    },
    /// Deliver an outbound webhook call triggered by a node.
    WebhookDelivery {
        /// Destination URL.
        url: String,
        /// Request body.
        body: serde_json::Value,
    },
    /// Send an email triggered by a node.
    EmailSend {
        /// Recipient address.
        to: String,
        /// Subject line.
        subject: String,
        /// Body, plain text or HTML per the driver's convention.
        body: String,
    },
}

/// Work queue interface for distributing jobs to workers. At-least-once
/// delivery: [`dequeue`](Self::dequeue) hands out a job that stays
/// in-flight until [`ack`](Self::ack) or [`nack`](Self::nack).
#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Enqueue a job, returning an opaque job id used for ack/nack.
    async fn enqueue(&self, payload: JobPayload) -> Result<String, PortsError>;

    /// Dequeue the next available job, waiting up to `timeout`. `None`
    /// means the wait elapsed with nothing available.
    async fn dequeue(&self, timeout: Duration) -> Result<Option<(String, JobPayload)>, PortsError>;

    /// Acknowledge successful processing, removing the job for good.
    async fn ack(&self, job_id: &str) -> Result<(), PortsError>;

    /// Negative-acknowledge: return the job to the queue for retry.
    async fn nack(&self, job_id: &str) -> Result<(), PortsError>;

    /// Number of jobs currently queued (not counting in-flight jobs).
    async fn len(&self) -> Result<usize, PortsError>;

    /// Whether the queue is empty. Default implementation defers to
    /// [`len`](Self::len).
    async fn is_empty(&self) -> Result<bool, PortsError> {
        Ok(self.len().await? == 0)
    }
}

//! In-memory bounded [`JobQueue`] driver (§6), adapted from the
//! teacher's `MemoryQueue` (`crates/drivers/queue-memory/src/lib.rs`):
//! the same bounded-`mpsc` + in-flight `HashMap` shape, retyped from a
//! bare `serde_json::Value` payload to this spec's closed
//! [`JobPayload`] enum.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use nebula_ports::{JobPayload, JobQueue, PortsError};
use tokio::sync::{mpsc, Mutex};

#[derive(Debug, Clone)]
struct QueueItem {
    id: String,
    payload: JobPayload,
}

/// In-memory bounded job queue.
///
/// Jobs flow through three states: **queued** (sitting in the `mpsc`
/// channel), **in-flight** (dequeued, awaiting ack/nack), and **done**
/// (acked and dropped, or nacked and requeued).
pub struct MemoryQueue {
    sender: mpsc::Sender<QueueItem>,
    receiver: Arc<Mutex<mpsc::Receiver<QueueItem>>>,
    in_flight: Arc<Mutex<HashMap<String, QueueItem>>>,
    queued_count: AtomicUsize,
}

impl MemoryQueue {
    /// Create a new memory queue with the given capacity. Enqueue fails
    /// with [`PortsError::Internal`] once the queue is full.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = mpsc::channel(capacity);
        Self {
            sender,
            receiver: Arc::new(Mutex::new(receiver)),
            in_flight: Arc::new(Mutex::new(HashMap::new())),
            queued_count: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl JobQueue for MemoryQueue {
    async fn enqueue(&self, payload: JobPayload) -> Result<String, PortsError> {
        let id = uuid::Uuid::new_v4().to_string();
        let item = QueueItem {
            id: id.clone(),
            payload,
        };
        self.sender
            .try_send(item)
            .map_err(|e| PortsError::Internal(format!("queue full or closed: {e}")))?;
        self.queued_count.fetch_add(1, Ordering::Relaxed);
        Ok(id)
    }

    async fn dequeue(&self, timeout: Duration) -> Result<Option<(String, JobPayload)>, PortsError> {
        let mut rx = self.receiver.lock().await;
        match tokio::time::timeout(timeout, rx.recv()).await {
            Ok(Some(item)) => {
                self.queued_count.fetch_sub(1, Ordering::Relaxed);
                let id = item.id.clone();
                let payload = item.payload.clone();
                self.in_flight.lock().await.insert(id.clone(), item);
                Ok(Some((id, payload)))
            }
            Ok(None) => Ok(None), // channel closed
            Err(_) => Ok(None),   // timeout elapsed
        }
    }

    async fn ack(&self, job_id: &str) -> Result<(), PortsError> {
        self.in_flight
            .lock()
            .await
            .remove(job_id)
            .map(|_| ())
            .ok_or_else(|| PortsError::not_found("Job", job_id))
    }

    async fn nack(&self, job_id: &str) -> Result<(), PortsError> {
        let item = self.in_flight.lock().await.remove(job_id);
        match item {
            Some(item) => {
                self.sender
                    .try_send(item)
                    .map_err(|e| PortsError::Internal(format!("requeue failed: {e}")))?;
                self.queued_count.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
            None => Err(PortsError::not_found("Job", job_id)),
        }
    }

    async fn len(&self) -> Result<usize, PortsError> {
        Ok(self.queued_count.load(Ordering::Relaxed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nebula_core::{ExecutionId, WorkflowId, WorkspaceId};
    use pretty_assertions::assert_eq;

    fn sample_payload() -> JobPayload {
        JobPayload::WorkflowExecution {
            execution_id: ExecutionId::new(),
            workflow_id: WorkflowId::new("wf1"),
            workspace_id: WorkspaceId::new("ws1"),
        }
    }

    #[tokio::test]
    async fn enqueue_and_dequeue() {
        let q = MemoryQueue::new(16);
        let job_id = q.enqueue(sample_payload()).await.unwrap();
        assert!(!job_id.is_empty());

        let (id, _payload) = q
            .dequeue(Duration::from_secs(1))
            .await
            .unwrap()
            .expect("should dequeue a job");
        assert_eq!(id, job_id);
    }

    #[tokio::test]
    async fn dequeue_returns_none_on_timeout() {
        let q = MemoryQueue::new(16);
        assert!(q.dequeue(Duration::from_millis(50)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn ack_removes_from_in_flight_and_double_ack_fails() {
        let q = MemoryQueue::new(16);
        let job_id = q.enqueue(sample_payload()).await.unwrap();
        let (id, _) = q.dequeue(Duration::from_secs(1)).await.unwrap().unwrap();
        assert_eq!(id, job_id);

        q.ack(&id).await.unwrap();
        assert!(q.ack(&id).await.is_err());
    }

    #[tokio::test]
    async fn nack_requeues_job() {
        let q = MemoryQueue::new(16);
        let job_id = q.enqueue(sample_payload()).await.unwrap();
        let (id, _) = q.dequeue(Duration::from_secs(1)).await.unwrap().unwrap();
        q.nack(&id).await.unwrap();

        let (id2, _) = q.dequeue(Duration::from_secs(1)).await.unwrap().unwrap();
        assert_eq!(id2, job_id);
    }

    #[tokio::test]
    async fn len_tracks_queued_count() {
        let q = MemoryQueue::new(16);
        assert_eq!(q.len().await.unwrap(), 0);
        assert!(q.is_empty().await.unwrap());

        q.enqueue(sample_payload()).await.unwrap();
        q.enqueue(sample_payload()).await.unwrap();
        assert_eq!(q.len().await.unwrap(), 2);

        let (id, _) = q.dequeue(Duration::from_secs(1)).await.unwrap().unwrap();
        assert_eq!(q.len().await.unwrap(), 1);
        q.ack(&id).await.unwrap();
        assert_eq!(q.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn enqueue_fails_when_full() {
        let q = MemoryQueue::new(1);
        q.enqueue(sample_payload()).await.unwrap();
        assert!(q.enqueue(sample_payload()).await.is_err());
    }

    #[tokio::test]
    async fn fifo_ordering() {
        let q = MemoryQueue::new(16);
        let mut ids = Vec::new();
        for _ in 0..3 {
            ids.push(q.enqueue(sample_payload()).await.unwrap());
        }

        for expected in ids {
            let (id, _) = q.dequeue(Duration::from_secs(1)).await.unwrap().unwrap();
            assert_eq!(id, expected);
        }
    }
}

//! Sub-workflow coordination (§4.6).
//!
//! `invoke` is the whole contract: build a child [`Execution`], enqueue
//! it, and for `mode=wait` poll the [`Rendezvous`] mailbox keyed by the
//! child's own [`ExecutionId`] (the correlation id -- §9 design note:
//! "the source uses a key-value store with polling; conceptually it is
//! a single-shot mailbox per correlation id").

use std::time::Duration;

use nebula_core::{Execution, ExecutionId, WorkflowId, WorkspaceId};
use nebula_node::Dependencies;
use nebula_ports::JobPayload;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

/// Polling granularity for `await_result` (§6: "polling is acceptable,
/// granularity ~500 ms").
const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Default rendezvous TTL a child stamps on its published result (§4.6:
/// "default TTL is generous enough (~5 minutes) to tolerate brief
/// coordinator delays"). Exposed so callers that publish a child's
/// result (the executor, on reaching a terminal status for a
/// `subWorkflow`-triggered execution) can reuse the same constant.
pub const DEFAULT_RESULT_TTL: Duration = Duration::from_secs(300);

/// How a `sub_workflow`/`execute_workflow` invocation should behave.
#[derive(Debug, Clone, Copy)]
pub enum Mode {
    /// Enqueue the child and return immediately without waiting for it.
    FireAndForget,
    /// Enqueue the child and block (cooperatively) until its result
    /// arrives on the rendezvous, or `timeout` elapses.
    Wait {
        /// Maximum time to wait for the child's result.
        timeout: Duration,
    },
}

/// What [`invoke`] returns to the node handler.
#[derive(Debug, Clone)]
pub enum InvokeOutcome {
    /// `mode=fire_and_forget`: the child was enqueued; nothing further
    /// is known about it from this call.
    Queued {
        /// Job queue id for the enqueued child execution.
        task_id: String,
        /// Correlation id the child will publish its result under
        /// (equal to its own [`ExecutionId`]).
        correlation_id: String,
        /// The child's workflow id, echoed back for the caller's
        /// output mapping.
        workflow_id: WorkflowId,
    },
    /// `mode=wait`: the child's published output.
    Output(Value),
}

/// Failure modes specific to sub-workflow coordination, distinct from
/// the generic [`nebula_error::Error`] kinds since a caller needs to
/// tell "child failed" apart from "we gave up waiting".
#[derive(Debug, thiserror::Error)]
pub enum InvokeError {
    /// A port call failed.
    #[error(transparent)]
    Port(#[from] nebula_ports::PortsError),
    /// The child execution reported failure.
    #[error("child execution failed: {0}")]
    Child(nebula_error::Error),
    /// `timeout` elapsed with no result published.
    #[error("timed out waiting for sub-workflow result")]
    Timeout,
    /// The wait was cancelled externally.
    #[error("sub-workflow wait cancelled")]
    Cancelled,
}

impl InvokeError {
    /// Translate into the workspace-wide error type for the node
    /// handler to return, preserving the distinction the `retry`/
    /// `try_catch` nodes rely on (§7).
    #[must_use]
    pub fn into_node_error(self) -> nebula_error::Error {
        match self {
            Self::Port(err) => nebula_error::Error::from(err),
            Self::Child(err) => err,
            Self::Timeout => nebula_error::Error::timeout("sub-workflow wait timed out"),
            Self::Cancelled => nebula_error::Error::cancelled(),
        }
    }
}

/// Enqueue a child workflow execution and, depending on `mode`, either
/// return immediately or await its result (§4.6 steps 1-4).
///
/// # Errors
///
/// See [`InvokeError`].
pub async fn invoke(
    deps: &Dependencies,
    parent_execution_id: ExecutionId,
    workflow_id: WorkflowId,
    workspace_id: WorkspaceId,
    input_data: Value,
    mode: Mode,
    cancellation: &CancellationToken,
) -> Result<InvokeOutcome, InvokeError> {
    let trigger_data = serde_json::json!({
        "parentExecutionId": parent_execution_id.to_string(),
    });
    let child = Execution::new(
        workflow_id.clone(),
        workspace_id.clone(),
        "subWorkflow",
        trigger_data,
        input_data,
    );
    let correlation_id = child.id.to_string();

    deps.executions.create(child.clone()).await?;
    let task_id = deps
        .job_queue
        .enqueue(JobPayload::WorkflowExecution {
            execution_id: child.id,
            workflow_id: workflow_id.clone(),
            workspace_id,
        })
        .await?;

    match mode {
        Mode::FireAndForget => Ok(InvokeOutcome::Queued {
            task_id,
            correlation_id,
            workflow_id,
        }),
        Mode::Wait { timeout } => await_child(deps, &correlation_id, timeout, cancellation).await,
    }
}

async fn await_child(
    deps: &Dependencies,
    correlation_id: &str,
    timeout: Duration,
    cancellation: &CancellationToken,
) -> Result<InvokeOutcome, InvokeError> {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if cancellation.is_cancelled() {
            return Err(InvokeError::Cancelled);
        }
        if let Some(result) = deps.rendezvous.await_result(correlation_id).await? {
            deps.rendezvous.delete(correlation_id).await?;
            return if result.succeeded {
                Ok(InvokeOutcome::Output(result.output.unwrap_or(Value::Null)))
            } else {
                Err(InvokeError::Child(
                    result.error.unwrap_or_else(|| nebula_error::Error::handler("sub-workflow failed")),
                ))
            };
        }

        let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
        if remaining.is_zero() {
            return Err(InvokeError::Timeout);
        }
        let wait = remaining.min(POLL_INTERVAL);
        tokio::select! {
            () = tokio::time::sleep(wait) => {}
            () = cancellation.cancelled() => return Err(InvokeError::Cancelled),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;
    use nebula_ports::{Event, EventPublisher, ExecutionService, PortsError, RendezvousResult};
    use nebula_ports::{JobQueue, Rendezvous};
    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;

    use super::*;

    #[derive(Default)]
    struct MockExecutions {
        created: Mutex<Vec<Execution>>,
    }

    #[async_trait]
    impl ExecutionService for MockExecutions {
        async fn create(&self, execution: Execution) -> Result<ExecutionId, PortsError> {
            let id = execution.id;
            self.created.lock().push(execution);
            Ok(id)
        }
        async fn get(&self, id: &ExecutionId) -> Result<Option<Execution>, PortsError> {
            Ok(self.created.lock().iter().find(|e| &e.id == id).cloned())
        }
        async fn set_status(
            &self,
            _id: &ExecutionId,
            _status: nebula_core::ExecutionStatus,
        ) -> Result<(), PortsError> {
            Ok(())
        }
        async fn append_node_result(
            &self,
            _id: &ExecutionId,
            _node_key: String,
            _result: nebula_core::NodeResult,
        ) -> Result<(), PortsError> {
            Ok(())
        }
        async fn merge_variables(
            &self,
            _id: &ExecutionId,
            _patch: serde_json::Map<String, Value>,
        ) -> Result<(), PortsError> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct MockQueue {
        enqueued: AtomicUsize,
    }

    #[async_trait]
    impl JobQueue for MockQueue {
        async fn enqueue(&self, _payload: JobPayload) -> Result<String, PortsError> {
            let n = self.enqueued.fetch_add(1, Ordering::SeqCst);
            Ok(format!("job-{n}"))
        }
        async fn dequeue(
            &self,
            _timeout: Duration,
        ) -> Result<Option<(String, JobPayload)>, PortsError> {
            Ok(None)
        }
        async fn ack(&self, _job_id: &str) -> Result<(), PortsError> {
            Ok(())
        }
        async fn nack(&self, _job_id: &str) -> Result<(), PortsError> {
            Ok(())
        }
        async fn len(&self) -> Result<usize, PortsError> {
            Ok(0)
        }
    }

    #[derive(Default)]
    struct MockRendezvous {
        results: Mutex<std::collections::HashMap<String, RendezvousResult>>,
    }

    #[async_trait]
    impl Rendezvous for MockRendezvous {
        async fn publish_result(
            &self,
            correlation_id: &str,
            result: RendezvousResult,
        ) -> Result<(), PortsError> {
            self.results.lock().insert(correlation_id.to_string(), result);
            Ok(())
        }
        async fn await_result(
            &self,
            correlation_id: &str,
        ) -> Result<Option<RendezvousResult>, PortsError> {
            Ok(self.results.lock().get(correlation_id).cloned())
        }
        async fn delete(&self, correlation_id: &str) -> Result<(), PortsError> {
            self.results.lock().remove(correlation_id);
            Ok(())
        }
    }

    struct NoopEvents;
    #[async_trait]
    impl EventPublisher for NoopEvents {
        async fn publish(&self, _event: Event) {}
    }

    fn deps(
        executions: Arc<MockExecutions>,
        queue: Arc<MockQueue>,
        rendezvous: Arc<MockRendezvous>,
    ) -> Dependencies {
        Dependencies {
            job_queue: queue,
            rendezvous,
            events: Arc::new(NoopEvents),
            executions,
        }
    }

    #[tokio::test]
    async fn fire_and_forget_enqueues_and_returns_immediately() {
        let executions = Arc::new(MockExecutions::default());
        let queue = Arc::new(MockQueue::default());
        let rendezvous = Arc::new(MockRendezvous::default());
        let deps = deps(executions.clone(), queue, rendezvous);

        let outcome = invoke(
            &deps,
            ExecutionId::new(),
            WorkflowId::new("child-wf"),
            WorkspaceId::new("ws1"),
            serde_json::json!({"a": 1}),
            Mode::FireAndForget,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        match outcome {
            InvokeOutcome::Queued { workflow_id, .. } => {
                assert_eq!(workflow_id, WorkflowId::new("child-wf"));
            }
            InvokeOutcome::Output(_) => panic!("expected Queued"),
        }
        assert_eq!(executions.created.lock().len(), 1);
    }

    #[tokio::test]
    async fn wait_returns_child_output_and_deletes_result() {
        let executions = Arc::new(MockExecutions::default());
        let queue = Arc::new(MockQueue::default());
        let rendezvous = Arc::new(MockRendezvous::default());

        // Pre-seed the rendezvous as if the child had already finished
        // by the time the parent polls.
        let parent = ExecutionId::new();
        let workflow_id = WorkflowId::new("child-wf");
        let deps_probe = deps(executions.clone(), queue.clone(), rendezvous.clone());

        // Run invoke in a task so we can publish the result concurrently.
        let rendezvous_for_publisher = rendezvous.clone();
        let invoke_fut = invoke(
            &deps_probe,
            parent,
            workflow_id,
            WorkspaceId::new("ws1"),
            serde_json::json!({"k": "v"}),
            Mode::Wait {
                timeout: Duration::from_secs(2),
            },
            &CancellationToken::new(),
        );

        let created_id = {
            // Give invoke a chance to create+enqueue before we look up the id.
            tokio::task::yield_now().await;
            executions.created.lock().first().map(|e| e.id)
        };

        let publisher = tokio::spawn(async move {
            // Wait until the execution row exists, then publish.
            loop {
                if let Some(id) = created_id.or_else(|| executions.created.lock().first().map(|e| e.id)) {
                    rendezvous_for_publisher
                        .publish_result(
                            &id.to_string(),
                            RendezvousResult {
                                succeeded: true,
                                output: Some(serde_json::json!({"k": "v"})),
                                error: None,
                            },
                        )
                        .await
                        .unwrap();
                    break;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        });

        let outcome = invoke_fut.await.unwrap();
        publisher.await.unwrap();

        match outcome {
            InvokeOutcome::Output(v) => assert_eq!(v, serde_json::json!({"k": "v"})),
            InvokeOutcome::Queued { .. } => panic!("expected Output"),
        }
        assert!(rendezvous.results.lock().is_empty());
    }

    #[tokio::test]
    async fn wait_times_out_when_child_never_publishes() {
        let executions = Arc::new(MockExecutions::default());
        let queue = Arc::new(MockQueue::default());
        let rendezvous = Arc::new(MockRendezvous::default());
        let deps = deps(executions, queue, rendezvous);

        let err = invoke(
            &deps,
            ExecutionId::new(),
            WorkflowId::new("child-wf"),
            WorkspaceId::new("ws1"),
            serde_json::json!({}),
            Mode::Wait {
                timeout: Duration::from_millis(50),
            },
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, InvokeError::Timeout));
    }

    #[tokio::test]
    async fn wait_surfaces_child_failure() {
        let executions = Arc::new(MockExecutions::default());
        let queue = Arc::new(MockQueue::default());
        let rendezvous = Arc::new(MockRendezvous::default());
        let deps = deps(executions.clone(), queue, rendezvous.clone());

        let invoke_fut = invoke(
            &deps,
            ExecutionId::new(),
            WorkflowId::new("child-wf"),
            WorkspaceId::new("ws1"),
            serde_json::json!({}),
            Mode::Wait {
                timeout: Duration::from_secs(2),
            },
            &CancellationToken::new(),
        );

        tokio::task::yield_now().await;
        let id = executions.created.lock().first().unwrap().id;
        rendezvous
            .publish_result(
                &id.to_string(),
                RendezvousResult {
                    succeeded: false,
                    output: None,
                    error: Some(nebula_error::Error::handler("boom")),
                },
            )
            .await
            .unwrap();

        let err = invoke_fut.await.unwrap_err();
        match err {
            InvokeError::Child(e) => assert_eq!(e.message(), "boom"),
            other => panic!("expected Child error, got {other:?}"),
        }
    }
}

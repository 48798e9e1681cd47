//! The `{ jobQueue, rendezvous, … }` bundle forwarded to handlers that
//! declare the *needs-dependencies* capability (§4.3).

use std::sync::Arc;

use nebula_ports::{EventPublisher, ExecutionService, JobQueue, Rendezvous};

/// External collaborators a node handler may need beyond its
/// [`ExecutionContext`](crate::context::ExecutionContext) -- today only
/// `sub_workflow`/`execute_workflow` need these, to create and enqueue a
/// child execution and rendezvous on its result.
///
/// `executions` generalizes §4.6's `enqueueWorkflowExecution(ctx,
/// payload)` (which creates-and-enqueues in one call) into this
/// workspace's two-step shape (`ExecutionService::create` then
/// `JobQueue::enqueue` of a [`nebula_ports::JobPayload::WorkflowExecution`]
/// referencing the id just created) -- the job queue port only ever
/// carries a pre-existing execution id, so the coordinator needs direct
/// access to create the child row before enqueuing it.
#[derive(Clone)]
pub struct Dependencies {
    /// Enqueues child workflow executions.
    pub job_queue: Arc<dyn JobQueue>,
    /// Awaits sub-workflow results.
    pub rendezvous: Arc<dyn Rendezvous>,
    /// Publishes lifecycle events; handlers may emit structured logs
    /// through this in addition to the executor's own publishing.
    pub events: Arc<dyn EventPublisher>,
    /// Creates the child execution row a sub-workflow invocation enqueues.
    pub executions: Arc<dyn ExecutionService>,
}

/// A handler that needs the shared [`Dependencies`] bundle implements
/// this in addition to [`NodeHandler`](crate::handler::NodeHandler). The
/// registry calls [`set_dependencies`](Self::set_dependencies) once, at
/// startup, on every registered handler that implements it.
pub trait NeedsDependencies {
    /// Receive the dependency bundle. Called exactly once, before the
    /// handler ever sees an invocation.
    fn set_dependencies(&self, deps: Dependencies);
}

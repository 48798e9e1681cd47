#![forbid(unsafe_code)]

//! # nebula-core
//!
//! Core identifiers and wire data model shared by every crate in the
//! Nebula workflow execution subsystem: [`id`] (typed entity ids),
//! [`graph`] (the workflow wire format), [`execution`] (the execution
//! record), and [`credential`] (the opaque credential payload).

pub mod credential;
pub mod execution;
pub mod graph;
pub mod id;

pub use credential::{CredentialData, Secret};
pub use execution::{Execution, NodeResult, Status as ExecutionStatus};
pub use graph::{BackoffType, Edge, Node, OnErrorPolicy, RetryPolicy, Workflow, MAIN_PORT};
pub use id::{CredentialId, ExecutionId, NodeId, WorkflowId, WorkspaceId};

/// Common prelude for crates building on `nebula-core`.
pub mod prelude {
    pub use crate::{
        CredentialData, CredentialId, Edge, Execution, ExecutionId, ExecutionStatus, Node,
        NodeId, NodeResult, OnErrorPolicy, Workflow, WorkflowId, WorkspaceId, MAIN_PORT,
    };
}

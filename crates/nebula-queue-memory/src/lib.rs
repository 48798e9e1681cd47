#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! # nebula-queue-memory
//!
//! In-memory drivers for every port in `nebula-ports`, suitable for the
//! single-process `worker` binary and for tests -- mirroring the
//! teacher's `crates/drivers/queue-memory` (bounded `mpsc` task queue)
//! but widened to cover this spec's full port set: a workflow/execution
//! store and a rendezvous mailbox alongside the job queue, since this
//! workspace has no separate storage-driver crates of its own (§1:
//! durable storage is "only the service interfaces are specified").
//!
//! None of these drivers survive a process restart; a production
//! deployment replaces them with durable backends behind the same
//! traits.

mod credential;
mod execution;
mod queue;
mod rendezvous;
mod workflow;

pub use credential::MemoryCredentialProvider;
pub use execution::MemoryExecutionService;
pub use queue::MemoryQueue;
pub use rendezvous::MemoryRendezvous;
pub use workflow::MemoryWorkflowService;

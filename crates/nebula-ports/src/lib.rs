#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! # nebula-ports
//!
//! External collaborator interfaces (ports) for the Nebula workflow
//! executor (§1 scope, §6).
//!
//! This crate defines only the **traits** the executor depends on; it
//! carries no driver implementations. It follows the same Ports &
//! Drivers (hexagonal) split as the rest of the workspace:
//!
//! - [`WorkflowService`] -- read access to workflow definitions
//! - [`ExecutionService`] -- persistence for execution state and results
//! - [`JobQueue`] -- work distribution for the worker pool
//! - [`Rendezvous`] -- sub-workflow call/return coordination
//! - [`CredentialProvider`] -- credential resolution
//! - [`EventPublisher`] -- lifecycle event fan-out
//!
//! All traits are `async_trait` and object-safe, suitable for use as
//! `Box<dyn Trait>` or `Arc<dyn Trait>` behind dependency injection. A
//! minimal in-memory driver for each is provided by `nebula-queue-memory`
//! (for `JobQueue` and `Rendezvous`) for tests and the single-process
//! worker binary; production drivers for durable backends are outside
//! this crate's scope.

pub mod credential;
pub mod error;
pub mod eventbus;
pub mod execution;
pub mod queue;
pub mod rendezvous;
pub mod workflow;

pub use credential::CredentialProvider;
pub use error::PortsError;
pub use eventbus::{Event, EventFilter, EventPublisher};
pub use execution::ExecutionService;
pub use queue::{JobPayload, JobQueue};
pub use rendezvous::{Rendezvous, RendezvousResult};
pub use workflow::WorkflowService;

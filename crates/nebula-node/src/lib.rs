#![forbid(unsafe_code)]

//! # nebula-node
//!
//! The node runtime: the handler contract every node type implements,
//! the process-wide registry that resolves `type` strings to handler
//! instances, and the per-invocation [`ExecutionContext`] (§4.3, §3).
//!
//! This crate has no opinion on *which* node types exist -- `nebula-nodes`
//! supplies the first-party control-flow and data-transform handlers,
//! and integration adapters are free to depend on this crate alone to
//! implement [`NodeHandler`].

pub mod context;
pub mod dependencies;
pub mod handler;
pub mod metadata;
pub mod registry;

pub use context::ExecutionContext;
pub use dependencies::{Dependencies, NeedsDependencies};
pub use handler::{NodeHandler, NodeOutput};
pub use metadata::{Category, NodeMetadata};
pub use registry::NodeRegistry;

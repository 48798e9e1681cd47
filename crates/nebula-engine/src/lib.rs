#![forbid(unsafe_code)]

//! # nebula-engine
//!
//! The graph executor: walks a [`nebula_core::Workflow`] from its
//! trigger node, resolving each node's input from its declared
//! predecessors, invoking the registered handler under a deadline, and
//! following whichever ports the output activates (§4.4).
//!
//! This crate has no opinion on *which* node types exist or *how*
//! executions and workflows are persisted -- it drives the walk against
//! [`nebula_node::NodeRegistry`] and the [`nebula_ports`] traits,
//! leaving concrete storage, queueing and event delivery to the
//! binaries that wire it up.

pub mod assemble;
pub mod control;
pub mod deadline;
pub mod error;
pub mod executor;

pub use assemble::assemble_input;
pub use control::{control_signal, ControlSignal, LoopIteration};
pub use deadline::Outcome as DeadlineOutcome;
pub use error::EngineError;
pub use executor::Executor;

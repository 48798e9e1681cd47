#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! # nebula-subworkflow
//!
//! The `sub_workflow`/`execute_workflow` node handlers (§4.6): the only
//! node types the core spec requires to reach outside one execution's
//! walk. Both delegate to [`coordinator::invoke`], which enqueues a
//! child execution on the shared [`nebula_ports::JobQueue`] and, for
//! `mode=wait`, polls the shared [`nebula_ports::Rendezvous`] mailbox
//! for the child's result under a caller-supplied timeout.
//!
//! This mirrors the teacher's split between a thin node handler
//! (`crates/action/src/logic/*`) and the coordination logic it calls
//! into (`crates/engine`'s sub-workflow dispatch) -- here collapsed into
//! one small crate since this spec scopes sub-workflow coordination as
//! a first-class core concern rather than an engine-internal detail.

mod coordinator;
mod handler;

pub use coordinator::{invoke, InvokeError, InvokeOutcome, Mode, DEFAULT_RESULT_TTL};
pub use handler::SubWorkflowHandler;

/// Register both sub-workflow node type aliases into `registry` (§4.6:
/// the spec names both `sub_workflow` and `execute_workflow`). Called
/// once by the worker binary at startup, before
/// [`nebula_node::NodeRegistry::freeze`].
pub fn register_all(registry: &mut nebula_node::NodeRegistry) {
    registry.register(std::sync::Arc::new(SubWorkflowHandler::new("sub_workflow")));
    registry.register(std::sync::Arc::new(SubWorkflowHandler::new(
        "execute_workflow",
    )));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registers_both_aliases() {
        let mut registry = nebula_node::NodeRegistry::new();
        register_all(&mut registry);
        assert!(registry.contains("sub_workflow"));
        assert!(registry.contains("execute_workflow"));
    }
}

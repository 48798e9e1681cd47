//! Event publisher port (§4.7, §6).
//!
//! The executor emits lifecycle [`Event`]s as an execution progresses;
//! an [`EventPublisher`] fans them out to whatever is listening
//! (websocket push to the authoring UI, audit log, etc). Publishing
//! never blocks or fails the execution -- a driver that cannot reach its
//! sink should drop the event and record the failure itself, not
//! propagate it back into the executor's control flow.

use async_trait::async_trait;
use nebula_core::{ExecutionId, ExecutionStatus, WorkflowId};
use serde::{Deserialize, Serialize};

/// A lifecycle event raised during execution (§4.7).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum Event {
    /// The execution transitioned to `running`.
    ExecutionStarted {
        /// The execution.
        execution_id: ExecutionId,
        /// Its workflow.
        workflow_id: WorkflowId,
    },
    /// A node finished (successfully or not).
    NodeCompleted {
        /// The execution it belongs to.
        execution_id: ExecutionId,
        /// The node (or `node#iteration`) key recorded in
        /// `Execution::node_results`.
        node_key: String,
        /// Whether the node succeeded.
        succeeded: bool,
    },
    /// The execution reached a terminal status.
    ExecutionFinished {
        /// The execution.
        execution_id: ExecutionId,
        /// The terminal status reached.
        status: ExecutionStatus,
    },
}

impl Event {
    /// The execution id every event variant carries.
    #[must_use]
    pub fn execution_id(&self) -> &ExecutionId {
        match self {
            Self::ExecutionStarted { execution_id, .. }
            | Self::NodeCompleted { execution_id, .. }
            | Self::ExecutionFinished { execution_id, .. } => execution_id,
        }
    }
}

/// Subscription filter: a listener narrows the event stream to one
/// execution and/or one event kind. `None` on either field matches
/// anything, so an empty filter matches every event.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Restrict to this execution only.
    pub execution_id: Option<ExecutionId>,
    /// Restrict to events whose discriminant name equals this string
    /// (e.g. `"executionStarted"`); compared case-sensitively against
    /// the `type` tag.
    pub kind: Option<String>,
}

impl EventFilter {
    /// An unrestricted filter matching every event.
    #[must_use]
    pub fn any() -> Self {
        Self::default()
    }

    /// Restrict to one execution.
    #[must_use]
    pub fn for_execution(execution_id: ExecutionId) -> Self {
        Self {
            execution_id: Some(execution_id),
            kind: None,
        }
    }

    /// Whether `event` matches this filter.
    #[must_use]
    pub fn matches(&self, event: &Event) -> bool {
        if let Some(id) = &self.execution_id {
            if id != event.execution_id() {
                return false;
            }
        }
        if let Some(kind) = &self.kind {
            if kind != event_kind(event) {
                return false;
            }
        }
        true
    }
}

fn event_kind(event: &Event) -> &'static str {
    match event {
        Event::ExecutionStarted { .. } => "executionStarted",
        Event::NodeCompleted { .. } => "nodeCompleted",
        Event::ExecutionFinished { .. } => "executionFinished",
    }
}

/// Fan-out sink for lifecycle events. Implementations must be
/// `Send + Sync` and must not block the caller for long -- they are
/// called inline on the executor's hot path.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish one event. Drivers swallow their own delivery failures
    /// rather than returning an error that would affect execution.
    async fn publish(&self, event: Event);
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample(execution_id: ExecutionId) -> Event {
        Event::NodeCompleted {
            execution_id,
            node_key: "a".into(),
            succeeded: true,
        }
    }

    #[test]
    fn any_filter_matches_everything() {
        let event = sample(ExecutionId::new());
        assert!(EventFilter::any().matches(&event));
    }

    #[test]
    fn execution_filter_rejects_other_executions() {
        let target = ExecutionId::new();
        let filter = EventFilter::for_execution(target);
        assert!(filter.matches(&sample(target)));
        assert!(!filter.matches(&sample(ExecutionId::new())));
    }

    #[test]
    fn kind_filter_matches_discriminant_name() {
        let event = sample(ExecutionId::new());
        let filter = EventFilter {
            execution_id: None,
            kind: Some("nodeCompleted".into()),
        };
        assert!(filter.matches(&event));

        let filter = EventFilter {
            execution_id: None,
            kind: Some("executionStarted".into()),
        };
        assert!(!filter.matches(&event));
    }
}

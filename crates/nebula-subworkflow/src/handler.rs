//! The `sub_workflow`/`execute_workflow` node handler (§4.6).
//!
//! Registered twice under both type strings (§9 Open Question 1: the
//! registry is last-writer-wins on duplicate names, so this crate
//! simply registers two distinct [`SubWorkflowHandler`] instances with
//! their own `node_type`, which the registry treats as unrelated keys
//! rather than a conflict).

use std::sync::OnceLock;

use async_trait::async_trait;
use nebula_core::WorkflowId;
use nebula_node::{
    Dependencies, ExecutionContext, NeedsDependencies, NodeHandler, NodeMetadata, NodeOutput,
};
use serde_json::Value;

use crate::coordinator::{self, InvokeOutcome, Mode};

/// Handler for `sub_workflow` and `execute_workflow` node config:
/// `{ workflowId, inputData?, mode: "wait"|"fire_and_forget", timeout? }`.
pub struct SubWorkflowHandler {
    node_type: String,
    meta: NodeMetadata,
    deps: OnceLock<Dependencies>,
}

impl SubWorkflowHandler {
    /// Build the handler for the given registry key (`"sub_workflow"` or
    /// `"execute_workflow"`).
    #[must_use]
    pub fn new(node_type: impl Into<String>) -> Self {
        let node_type = node_type.into();
        Self {
            meta: NodeMetadata::new(
                node_type.clone(),
                "Execute Sub-workflow",
                "Invokes another workflow, optionally waiting for its result",
            ),
            node_type,
            deps: OnceLock::new(),
        }
    }

    fn dependencies(&self) -> nebula_error::Result<&Dependencies> {
        self.deps
            .get()
            .ok_or_else(|| nebula_error::Error::fatal("sub_workflow handler has no dependencies configured"))
    }
}

impl NeedsDependencies for SubWorkflowHandler {
    fn set_dependencies(&self, deps: Dependencies) {
        // `OnceLock::set` silently no-ops on a second call; the registry
        // calls this exactly once at startup (§4.3), so a second call
        // here would indicate a programming error, not a race.
        let _ = self.deps.set(deps);
    }
}

#[async_trait]
impl NodeHandler for SubWorkflowHandler {
    fn node_type(&self) -> &str {
        &self.node_type
    }

    fn metadata(&self) -> &NodeMetadata {
        &self.meta
    }

    async fn execute(&self, ctx: &ExecutionContext) -> nebula_error::Result<NodeOutput> {
        let deps = self.dependencies()?;

        let workflow_id = ctx
            .config
            .get("workflowId")
            .and_then(Value::as_str)
            .ok_or_else(|| nebula_error::Error::validation("sub_workflow requires `workflowId`"))?;
        let input_data = ctx
            .config
            .get("inputData")
            .cloned()
            .unwrap_or_else(|| Value::Object(serde_json::Map::new()));
        let mode_str = ctx
            .config
            .get("mode")
            .and_then(Value::as_str)
            .unwrap_or("wait");

        let mode = match mode_str {
            "fire_and_forget" => Mode::FireAndForget,
            "wait" => {
                let timeout_secs = ctx
                    .config
                    .get("timeout")
                    .and_then(Value::as_u64)
                    .unwrap_or(300);
                Mode::Wait {
                    timeout: std::time::Duration::from_secs(timeout_secs),
                }
            }
            other => {
                return Err(nebula_error::Error::validation(format!(
                    "sub_workflow: unknown mode `{other}`"
                )))
            }
        };

        let outcome = coordinator::invoke(
            deps,
            ctx.execution_id,
            WorkflowId::new(workflow_id),
            ctx.workspace_id.clone(),
            input_data,
            mode,
            &ctx.cancellation,
        )
        .await
        .map_err(coordinator::InvokeError::into_node_error)?;

        Ok(match outcome {
            InvokeOutcome::Queued {
                task_id,
                correlation_id,
                workflow_id,
            } => {
                let mut out = NodeOutput::new();
                out.insert("queued".into(), Value::Bool(true));
                out.insert("taskId".into(), Value::String(task_id));
                out.insert("correlationId".into(), Value::String(correlation_id));
                out.insert("workflowId".into(), Value::String(workflow_id.to_string()));
                out
            }
            InvokeOutcome::Output(value) => value.as_object().cloned().unwrap_or_else(|| {
                let mut out = NodeOutput::new();
                out.insert("result".into(), value);
                out
            }),
        })
    }

    fn needs_dependencies(&self) -> Option<&dyn NeedsDependencies> {
        Some(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_reports_requested_node_type() {
        let handler = SubWorkflowHandler::new("execute_workflow");
        assert_eq!(handler.node_type(), "execute_workflow");
    }

    #[tokio::test]
    async fn execute_without_dependencies_is_fatal() {
        use nebula_core::{ExecutionId, NodeId};
        use parking_lot::RwLock;
        use std::sync::Arc;

        let handler = SubWorkflowHandler::new("sub_workflow");
        let ctx = ExecutionContext::new(
            ExecutionId::new(),
            nebula_core::WorkflowId::new("wf1"),
            nebula_core::WorkspaceId::new("ws1"),
            NodeId::new("n1"),
            serde_json::json!({}),
            serde_json::json!({"workflowId": "child"}).as_object().cloned().unwrap(),
            Arc::new(RwLock::new(serde_json::Map::new())),
        );
        let err = handler.execute(&ctx).await.unwrap_err();
        assert!(err.is_fatal());
    }
}

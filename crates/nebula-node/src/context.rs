//! Per-node invocation context (§3 `ExecutionContext`, §4.4).

use std::fmt;
use std::sync::Arc;

use nebula_core::{CredentialData, CredentialId, ExecutionId, NodeId, WorkflowId, WorkspaceId};
use parking_lot::RwLock;
use tokio_util::sync::CancellationToken;

use nebula_ports::CredentialProvider;

/// The transient bag passed to a node handler's
/// [`execute`](crate::handler::NodeHandler::execute) call.
///
/// `input` holds the assembled upstream data (`$json`/`$input` already
/// resolved by the executor), `config` is the node's static config with
/// templates already resolved against that same input, and `variables`
/// is a shared handle onto the execution-wide scratchpad -- writes
/// through [`set_variable`](Self::set_variable) are immediately visible
/// to every other node sharing this context's execution.
#[non_exhaustive]
pub struct ExecutionContext {
    /// The execution this invocation belongs to.
    pub execution_id: ExecutionId,
    /// The workflow being run.
    pub workflow_id: WorkflowId,
    /// The owning workspace.
    pub workspace_id: WorkspaceId,
    /// The node being invoked.
    pub node_id: NodeId,
    /// Assembled upstream input, keyed by source node id, with `$json`
    /// and `$input` already present per §4.4 `assembleInput`.
    pub input: serde_json::Value,
    /// The node's config, with template tokens already resolved.
    pub config: serde_json::Map<String, serde_json::Value>,
    /// Cooperative cancellation signal derived from the execution's
    /// deadline and any external cancel request.
    pub cancellation: CancellationToken,
    variables: Arc<RwLock<serde_json::Map<String, serde_json::Value>>>,
    credentials: Option<Arc<dyn CredentialProvider>>,
}

impl ExecutionContext {
    /// Build a context for one node invocation.
    #[must_use]
    pub fn new(
        execution_id: ExecutionId,
        workflow_id: WorkflowId,
        workspace_id: WorkspaceId,
        node_id: NodeId,
        input: serde_json::Value,
        config: serde_json::Map<String, serde_json::Value>,
        variables: Arc<RwLock<serde_json::Map<String, serde_json::Value>>>,
    ) -> Self {
        Self {
            execution_id,
            workflow_id,
            workspace_id,
            node_id,
            input,
            config,
            cancellation: CancellationToken::new(),
            variables,
            credentials: None,
        }
    }

    /// Attach a pre-existing cancellation token (the executor derives
    /// one child token per node invocation from the execution's root
    /// token).
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Attach the credential provider used by
    /// [`get_credential`](Self::get_credential).
    #[must_use]
    pub fn with_credentials(mut self, provider: Arc<dyn CredentialProvider>) -> Self {
        self.credentials = Some(provider);
        self
    }

    /// Read a workflow-wide variable written by a prior `set_variable`
    /// node.
    #[must_use]
    pub fn get_variable(&self, key: &str) -> Option<serde_json::Value> {
        self.variables.read().get(key).cloned()
    }

    /// Write a workflow-wide variable; visible to every node scheduled
    /// after this call within the same execution (§8 "Variables"
    /// invariant).
    pub fn set_variable(&self, key: impl Into<String>, value: serde_json::Value) {
        self.variables.write().insert(key.into(), value);
    }

    /// Snapshot all variables, e.g. for template resolution scope.
    #[must_use]
    pub fn variables_snapshot(&self) -> serde_json::Map<String, serde_json::Value> {
        self.variables.read().clone()
    }

    /// Resolve a credential by id. `getCredential(credentialId)` from
    /// §3, hiding storage and decryption behind the configured
    /// [`CredentialProvider`].
    ///
    /// # Errors
    ///
    /// Returns a `fatal` error if no provider is configured, a `fatal`
    /// error if the id is unknown, or whatever the provider itself
    /// returns, translated through its `PortsError -> Error` bridge.
    pub async fn get_credential(
        &self,
        id: &CredentialId,
    ) -> nebula_error::Result<CredentialData> {
        let provider = self.credentials.as_ref().ok_or_else(|| {
            nebula_error::Error::fatal("no credential provider configured")
        })?;
        provider
            .get(id)
            .await
            .map_err(nebula_error::Error::from)?
            .ok_or_else(|| nebula_error::Error::fatal(format!("unknown credential: {id}")))
    }

    /// `true` if cancellation has been requested for this invocation.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }
}

impl fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("execution_id", &self.execution_id)
            .field("workflow_id", &self.workflow_id)
            .field("node_id", &self.node_id)
            .field("cancelled", &self.is_cancelled())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ctx() -> ExecutionContext {
        ExecutionContext::new(
            ExecutionId::new(),
            WorkflowId::new("wf1"),
            WorkspaceId::new("ws1"),
            NodeId::new("n1"),
            serde_json::json!({}),
            serde_json::Map::new(),
            Arc::new(RwLock::new(serde_json::Map::new())),
        )
    }

    #[test]
    fn set_then_get_variable() {
        let ctx = ctx();
        assert!(ctx.get_variable("a").is_none());
        ctx.set_variable("a", serde_json::json!(1));
        assert_eq!(ctx.get_variable("a"), Some(serde_json::json!(1)));
    }

    #[test]
    fn variables_shared_across_contexts() {
        let vars = Arc::new(RwLock::new(serde_json::Map::new()));
        let ctx_a = ExecutionContext::new(
            ExecutionId::new(),
            WorkflowId::new("wf1"),
            WorkspaceId::new("ws1"),
            NodeId::new("a"),
            serde_json::json!({}),
            serde_json::Map::new(),
            vars.clone(),
        );
        let ctx_b = ExecutionContext::new(
            ExecutionId::new(),
            WorkflowId::new("wf1"),
            WorkspaceId::new("ws1"),
            NodeId::new("b"),
            serde_json::json!({}),
            serde_json::Map::new(),
            vars,
        );
        ctx_a.set_variable("x", serde_json::json!("seen"));
        assert_eq!(ctx_b.get_variable("x"), Some(serde_json::json!("seen")));
    }

    #[tokio::test]
    async fn get_credential_without_provider_is_fatal() {
        let ctx = ctx();
        let err = ctx
            .get_credential(&CredentialId::new("c1"))
            .await
            .unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn is_cancelled_reflects_token() {
        let ctx = ctx();
        assert!(!ctx.is_cancelled());
        ctx.cancellation.cancel();
        assert!(ctx.is_cancelled());
    }
}

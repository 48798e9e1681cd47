//! The node contract every handler implements (§4.3).

use async_trait::async_trait;

use crate::context::ExecutionContext;
use crate::dependencies::NeedsDependencies;
use crate::metadata::NodeMetadata;

/// A node's output: a free-form mapping whose shape is node-type
/// specific. The executor stores it verbatim under the node's id for
/// downstream `assembleInput` calls.
pub type NodeOutput = serde_json::Map<String, serde_json::Value>;

/// A registered node type. Implementations are stored behind
/// `Arc<dyn NodeHandler>` in the [`NodeRegistry`](crate::registry::NodeRegistry)
/// and invoked once per graph-walk step.
///
/// Handlers needing the shared job-queue/rendezvous/event-publisher
/// bundle (the *needs-dependencies* capability, §4.3) override
/// [`needs_dependencies`](Self::needs_dependencies) to expose themselves
/// as a [`NeedsDependencies`]; the registry calls it once at startup for
/// every registered handler.
#[async_trait]
pub trait NodeHandler: Send + Sync {
    /// The registry key this handler answers to, e.g. `"condition"`.
    fn node_type(&self) -> &str;

    /// Static metadata describing this node type.
    fn metadata(&self) -> &NodeMetadata;

    /// Execute the node against `ctx`. A non-`Ok` result is subject to
    /// the node's `onError` policy (§7); handlers should not themselves
    /// interpret that policy.
    async fn execute(&self, ctx: &ExecutionContext) -> nebula_error::Result<NodeOutput>;

    /// Opt in to dependency injection by returning `Some(self)`. The
    /// default `None` is correct for the great majority of handlers,
    /// which need nothing beyond their [`ExecutionContext`].
    fn needs_dependencies(&self) -> Option<&dyn NeedsDependencies> {
        None
    }
}

//! Process-wide node registry (§4.3).
//!
//! Populated once at startup by `apps/worker`, then read-only for the
//! lifetime of the process -- the executor's only way to resolve a
//! node's `type` string to a handler instance. No hard-coded node-type
//! list lives anywhere else in the workspace.

use std::collections::HashMap;
use std::sync::Arc;

use crate::dependencies::Dependencies;
use crate::handler::NodeHandler;
use crate::metadata::NodeMetadata;

/// `type -> handler` and `type -> metadata` registry.
///
/// Registration is the only operation requiring a lock
/// ([`register`](Self::register) takes `&mut self`); lookups
/// ([`get`](Self::get)) take `&self` and are lock-free once the registry
/// is wrapped in an `Arc` and frozen, matching §4.3's "no locking on the
/// hot path" requirement from the concurrency model (§5).
#[derive(Default)]
pub struct NodeRegistry {
    handlers: HashMap<String, Arc<dyn NodeHandler>>,
    frozen: bool,
}

impl NodeRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler. A duplicate `node_type` overwrites the prior
    /// entry; callers should log when that happens (the executor does,
    /// at startup, via `tracing`).
    ///
    /// # Panics
    ///
    /// Panics if called after [`freeze`](Self::freeze) -- registration
    /// is a startup-only operation.
    pub fn register(&mut self, handler: Arc<dyn NodeHandler>) {
        assert!(!self.frozen, "cannot register a handler after freeze()");
        let key = handler.node_type().to_string();
        if self.handlers.contains_key(&key) {
            tracing::warn!(node_type = %key, "overwriting existing node handler registration");
        }
        self.handlers.insert(key, handler);
    }

    /// Forward `deps` to every registered handler that implements
    /// [`NeedsDependencies`] (§4.3 "needs-dependencies capability").
    /// Idempotent; typically called once, right before
    /// [`freeze`](Self::freeze).
    pub fn set_dependencies(&self, deps: Dependencies) {
        for handler in self.handlers.values() {
            if let Some(needs) = handler.needs_dependencies() {
                needs.set_dependencies(deps.clone());
            }
        }
    }

    /// Mark the registry read-only. The executor calls this once at
    /// startup, after all handlers are registered and dependencies
    /// injected; subsequent [`register`](Self::register) calls panic.
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    /// Whether [`freeze`](Self::freeze) has been called.
    #[must_use]
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Look up a handler by its type string.
    #[must_use]
    pub fn get(&self, node_type: &str) -> Option<Arc<dyn NodeHandler>> {
        self.handlers.get(node_type).cloned()
    }

    /// Whether `node_type` has a registered handler.
    #[must_use]
    pub fn contains(&self, node_type: &str) -> bool {
        self.handlers.contains_key(node_type)
    }

    /// Metadata for every registered node type.
    #[must_use]
    pub fn list(&self) -> Vec<&NodeMetadata> {
        self.handlers.values().map(|h| h.metadata()).collect()
    }

    /// Number of registered node types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Whether no node types are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl std::fmt::Debug for NodeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeRegistry")
            .field("count", &self.handlers.len())
            .field("frozen", &self.frozen)
            .finish()
    }
}

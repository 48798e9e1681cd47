//! In-memory [`CredentialProvider`] driver (§6). Stands in for the
//! real credential store this spec deliberately places out of scope
//! (§1: "Credential storage/encryption (a `CredentialProvider`
//! interface is consumed)") -- useful for local development and for
//! exercising §8's credential-hygiene invariant in tests without a real
//! vault.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use nebula_core::{CredentialData, CredentialId};
use nebula_ports::{CredentialProvider, PortsError};

/// In-memory credential store.
#[derive(Clone, Default)]
pub struct MemoryCredentialProvider {
    credentials: Arc<DashMap<CredentialId, CredentialData>>,
}

impl MemoryCredentialProvider {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a credential. Callers are responsible for
    /// populating this from wherever plaintext is sourced (an env var,
    /// a local secrets file); this driver performs no encryption of
    /// its own.
    pub fn put(&self, id: CredentialId, data: CredentialData) {
        self.credentials.insert(id, data);
    }
}

#[async_trait]
impl CredentialProvider for MemoryCredentialProvider {
    async fn get(&self, id: &CredentialId) -> Result<Option<CredentialData>, PortsError> {
        Ok(self.credentials.get(id).map(|entry| entry.value().clone()))
    }
}

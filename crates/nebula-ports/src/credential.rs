//! Credential resolution port (§6, "CredentialProvider (consumed)").

use async_trait::async_trait;
use nebula_core::{CredentialData, CredentialId};

use crate::error::PortsError;

/// Resolves stored credential material by id. A node's `config` refers
/// to credentials only by [`CredentialId`]; the handler never sees where
/// the plaintext is stored.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Fetch credential material by id. `Ok(None)` means no such
    /// credential exists (a node referencing it is a configuration
    /// error, not a transient failure).
    async fn get(&self, id: &CredentialId) -> Result<Option<CredentialData>, PortsError>;
}

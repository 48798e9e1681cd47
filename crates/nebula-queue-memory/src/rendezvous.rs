//! In-memory [`Rendezvous`] driver (§4.6, §9 design note: "conceptually
//! it is a single-shot mailbox per correlation id ... an implementation
//! may back this with a channel registry for in-process children and a
//! persistent key with a short TTL for cross-process"). This driver
//! implements the in-process half: a `DashMap<String, RendezvousResult>`
//! keyed by correlation id, with a background sweep dropping entries
//! past their TTL so an abandoned fire-and-forget child cannot leak
//! memory forever.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use nebula_ports::{PortsError, Rendezvous, RendezvousResult};

struct Entry {
    result: RendezvousResult,
    expires_at: Instant,
}

/// In-memory rendezvous mailbox, one process wide.
#[derive(Clone, Default)]
pub struct MemoryRendezvous {
    entries: Arc<DashMap<String, Entry>>,
}

impl MemoryRendezvous {
    /// Create an empty rendezvous.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every entry whose TTL has elapsed. Callers (the worker shell)
    /// run this on an interval; it is not required for correctness
    /// within a TTL window, only to reclaim space from children whose
    /// parent never consumed the result (crashed, or used
    /// `fire_and_forget`).
    pub fn sweep_expired(&self) {
        let now = Instant::now();
        self.entries.retain(|_, entry| entry.expires_at > now);
    }
}

#[async_trait]
impl Rendezvous for MemoryRendezvous {
    async fn publish_result(
        &self,
        correlation_id: &str,
        result: RendezvousResult,
    ) -> Result<(), PortsError> {
        self.entries.insert(
            correlation_id.to_string(),
            Entry {
                result,
                expires_at: Instant::now() + Duration::from_secs(300),
            },
        );
        Ok(())
    }

    async fn await_result(
        &self,
        correlation_id: &str,
    ) -> Result<Option<RendezvousResult>, PortsError> {
        match self.entries.get(correlation_id) {
            Some(entry) if entry.expires_at > Instant::now() => Ok(Some(entry.result.clone())),
            Some(_) => Ok(None), // expired, treated as not-yet-arrived
            None => Ok(None),
        }
    }

    async fn delete(&self, correlation_id: &str) -> Result<(), PortsError> {
        self.entries.remove(correlation_id);
        Ok(())
    }
}

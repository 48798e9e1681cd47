//! Layered worker configuration (§2.8): defaults, optionally overridden
//! by a TOML file, then by `NEBULA_`-prefixed environment variables --
//! the same `figment` layering `apps/cli` wires up.

use std::path::PathBuf;
use std::time::Duration;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

/// Worker process configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Number of concurrent worker loops dequeuing and driving executions
    /// (§5 "Scheduling model": "one worker process runs N concurrent
    /// executions, bounded by configured concurrency").
    pub concurrency: usize,
    /// Capacity of the in-memory job queue.
    pub queue_capacity: usize,
    /// Capacity of the in-process event bus broadcast channel.
    pub event_bus_capacity: usize,
    /// How long a worker loop waits on an empty queue before polling again.
    pub dequeue_timeout_ms: u64,
    /// Default per-node timeout for nodes without their own `timeout` option.
    pub default_node_timeout_ms: u64,
    /// How often the rendezvous mailbox sweeps expired entries.
    pub rendezvous_sweep_interval_ms: u64,
    /// `RUST_LOG`-style filter directive for tracing.
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            concurrency: 4,
            queue_capacity: 1024,
            event_bus_capacity: 1024,
            dequeue_timeout_ms: 1_000,
            default_node_timeout_ms: 30_000,
            rendezvous_sweep_interval_ms: 60_000,
            log_filter: "info".to_string(),
        }
    }
}

impl Config {
    /// Load defaults, then `path` if it exists, then `NEBULA_`-prefixed
    /// environment variables, last-wins.
    pub fn load(path: Option<&PathBuf>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = path {
            figment = figment.merge(Toml::file(path));
        }
        figment = figment.merge(Env::prefixed("NEBULA_"));
        figment.extract()
    }

    /// [`Self::dequeue_timeout_ms`] as a [`Duration`].
    #[must_use]
    pub fn dequeue_timeout(&self) -> Duration {
        Duration::from_millis(self.dequeue_timeout_ms)
    }

    /// [`Self::default_node_timeout_ms`] as a [`Duration`].
    #[must_use]
    pub fn default_node_timeout(&self) -> Duration {
        Duration::from_millis(self.default_node_timeout_ms)
    }

    /// [`Self::rendezvous_sweep_interval_ms`] as a [`Duration`].
    #[must_use]
    pub fn rendezvous_sweep_interval(&self) -> Duration {
        Duration::from_millis(self.rendezvous_sweep_interval_ms)
    }
}

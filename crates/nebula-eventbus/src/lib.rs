#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! # nebula-eventbus
//!
//! In-process broadcast [`EventPublisher`] driver (§4.7), adapted from
//! the teacher's `telemetry::event::EventBus` (`crates/telemetry/src/
//! event.rs`): a `tokio::sync::broadcast` channel fanning the
//! executor's [`Event`]s out to filtered subscribers, dropping events
//! for subscribers with no one listening rather than blocking the
//! executor's hot path (§4.7: "Events are fire-and-forget; the executor
//! never blocks on publishing").

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use nebula_ports::{Event, EventFilter, EventPublisher};
use tokio::sync::broadcast;

/// Broadcast-based [`EventPublisher`] implementation.
///
/// Subscribers that fall behind the channel's capacity silently miss
/// the oldest events (`broadcast::error::RecvError::Lagged`) rather
/// than stalling publication for everyone else -- the same trade-off
/// the teacher's `EventBus` makes.
pub struct EventBus {
    sender: broadcast::Sender<Event>,
    emitted: AtomicU64,
}

impl EventBus {
    /// Create a bus with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            emitted: AtomicU64::new(0),
        }
    }

    /// Subscribe to every event matching `filter`.
    #[must_use]
    pub fn subscribe(&self, filter: EventFilter) -> EventSubscriber {
        EventSubscriber {
            receiver: self.sender.subscribe(),
            filter,
        }
    }

    /// Total events emitted since creation (including to zero
    /// subscribers).
    #[must_use]
    pub fn total_emitted(&self) -> u64 {
        self.emitted.load(Ordering::Relaxed)
    }

    /// Number of currently active subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

#[async_trait]
impl EventPublisher for EventBus {
    async fn publish(&self, event: Event) {
        self.emitted.fetch_add(1, Ordering::Relaxed);
        // A closed channel (no subscribers ever existed) is not an
        // error; fire-and-forget per §4.7.
        let _ = self.sender.send(event);
    }
}

/// A filtered subscription handle returned by [`EventBus::subscribe`].
pub struct EventSubscriber {
    receiver: broadcast::Receiver<Event>,
    filter: EventFilter,
}

impl EventSubscriber {
    /// Wait for the next event matching this subscriber's filter,
    /// skipping non-matching events and recovering transparently from
    /// lag.
    pub async fn recv(&mut self) -> Option<Event> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if self.filter.matches(&event) => return Some(event),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "event subscriber lagged, skipping missed events");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

//! Per-node deadline enforcement (§4.4 point 4, §9 "Timeouts must be
//! enforced by the executor using the per-invocation context").

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

/// How a deadline-bounded future ended.
pub enum Outcome<T> {
    /// The future finished within the deadline and without cancellation.
    Completed(T),
    /// The deadline elapsed first.
    TimedOut,
    /// The execution was cancelled before the future finished.
    Cancelled,
}

/// Race `fut` against `timeout` and `cancellation`, whichever comes
/// first.
pub async fn race<F, T>(timeout: Duration, cancellation: &CancellationToken, fut: F) -> Outcome<T>
where
    F: Future<Output = T>,
{
    tokio::select! {
        biased;
        () = cancellation.cancelled() => Outcome::Cancelled,
        res = tokio::time::timeout(timeout, fut) => match res {
            Ok(value) => Outcome::Completed(value),
            Err(_) => Outcome::TimedOut,
        },
    }
}

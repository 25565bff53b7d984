//! Bounded waiting for rendered pages

use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

/// How a bounded wait ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// The check reported ready
    Ready,

    /// The deadline passed first; callers continue with what they have
    DeadlineElapsed,
}

/// Calls `check` every `interval` until it returns true or `deadline` passes
///
/// The check always runs at least once, and once more after the last sleep,
/// so a condition that becomes true right at the deadline is still seen.
pub async fn poll_until<F, Fut>(interval: Duration, deadline: Duration, mut check: F) -> WaitOutcome
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let started = Instant::now();

    loop {
        if check().await {
            return WaitOutcome::Ready;
        }

        let elapsed = started.elapsed();
        if elapsed >= deadline {
            return WaitOutcome::DeadlineElapsed;
        }

        tokio::time::sleep(interval.min(deadline - elapsed)).await;
    }
}

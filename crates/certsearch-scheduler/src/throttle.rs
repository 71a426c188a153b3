//! Cancellable waiting between scan iterations.

use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// How a throttled wait ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// The full delay elapsed.
    Elapsed,
    /// Cancellation was requested before the delay elapsed.
    Cancelled,
}

/// Wait for `delay` unless `cancel` fires first.
///
/// A token that is already cancelled wins even when `delay` is zero, so a
/// loop that never sleeps still observes shutdown at every iteration.
pub async fn wait_or_cancelled(delay: Duration, cancel: &CancellationToken) -> WaitOutcome {
    tokio::select! {
        biased;
        () = cancel.cancelled() => WaitOutcome::Cancelled,
        () = tokio::time::sleep(delay) => WaitOutcome::Elapsed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn test_delay_elapses() {
        let cancel = CancellationToken::new();
        let started = Instant::now();

        let outcome = wait_or_cancelled(Duration::from_secs(15), &cancel).await;

        assert_eq!(outcome, WaitOutcome::Elapsed);
        assert!(started.elapsed() >= Duration::from_secs(15));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_delay_elapses_immediately() {
        let cancel = CancellationToken::new();
        let outcome = wait_or_cancelled(Duration::ZERO, &cancel).await;
        assert_eq!(outcome, WaitOutcome::Elapsed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_already_cancelled_wins_over_zero_delay() {
        let cancel = CancellationToken::new();
        cancel.cancel();

        let outcome = wait_or_cancelled(Duration::ZERO, &cancel).await;
        assert_eq!(outcome, WaitOutcome::Cancelled);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_interrupts_wait() {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        let started = Instant::now();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(2)).await;
            trigger.cancel();
        });

        let outcome = wait_or_cancelled(Duration::from_secs(15), &cancel).await;

        assert_eq!(outcome, WaitOutcome::Cancelled);
        assert!(started.elapsed() < Duration::from_secs(15));
    }
}

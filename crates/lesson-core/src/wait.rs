//! Cancellable delays used between playback segments.

use crate::cancellation::CancellationToken;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    Elapsed,
    Cancelled,
}

/// Sleep for `duration_ms`, returning early if `cancel` fires.
///
/// Non-positive and non-finite durations return without creating a timer.
/// The sleep and the cancellation listener are both dropped on every
/// return path.
pub async fn wait_ms(duration_ms: f64, cancel: &CancellationToken) -> WaitOutcome {
    if cancel.is_cancelled() {
        return WaitOutcome::Cancelled;
    }
    if !duration_ms.is_finite() || duration_ms <= 0.0 {
        return WaitOutcome::Elapsed;
    }

    let delay = Duration::try_from_secs_f64(duration_ms / 1000.0).unwrap_or(Duration::MAX);
    tokio::select! {
        _ = tokio::time::sleep(delay) => WaitOutcome::Elapsed,
        _ = cancel.cancelled() => WaitOutcome::Cancelled,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn degenerate_durations_return_without_time_passing() {
        let token = CancellationToken::new();
        let started = Instant::now();
        for duration in [0.0, -250.0, f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert_eq!(wait_ms(duration, &token).await, WaitOutcome::Elapsed);
        }
        assert_eq!(Instant::now(), started);
    }

    #[tokio::test(start_paused = true)]
    async fn waits_full_duration_when_not_cancelled() {
        let token = CancellationToken::new();
        let started = Instant::now();
        assert_eq!(wait_ms(1500.0, &token).await, WaitOutcome::Elapsed);
        assert!(started.elapsed() >= Duration::from_millis(1500));
    }

    #[tokio::test(start_paused = true)]
    async fn already_cancelled_token_short_circuits() {
        let token = CancellationToken::new();
        token.cancel();
        let started = Instant::now();
        assert_eq!(wait_ms(10_000.0, &token).await, WaitOutcome::Cancelled);
        assert_eq!(Instant::now(), started);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_during_wait_returns_early() {
        let token = CancellationToken::new();
        let canceller = {
            let token = token.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(200)).await;
                token.cancel();
            })
        };
        let started = Instant::now();
        assert_eq!(wait_ms(5_000.0, &token).await, WaitOutcome::Cancelled);
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(200));
        assert!(elapsed < Duration::from_millis(5_000));
        canceller.await.expect("canceller should join");
    }
}

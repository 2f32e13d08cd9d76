//! Retry with exponential backoff for model calls.

use async_trait::async_trait;
use notewright_core::error::{Error, ProviderError, Result};
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::warn;

const BASE_DELAY_MS: u64 = 1000;

/// Waits between attempts. Swappable so tests can observe the schedule.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Delay after failed attempt `attempt` (0-based): `2^attempt` seconds.
pub fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_millis(BASE_DELAY_MS.saturating_mul(1u64 << attempt.min(30)))
}

/// Run `op` up to `max(max_retries, 1)` times.
///
/// Non-retryable errors fail at once. Exhaustion yields
/// [`Error::RetriesExhausted`] carrying the last failure. Cancellation during
/// a backoff wait yields [`Error::Cancelled`].
pub async fn with_retries<T, F, Fut>(
    max_retries: u32,
    sleeper: &dyn Sleeper,
    cancel: &CancellationToken,
    mut op: F,
) -> Result<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = std::result::Result<T, ProviderError>>,
{
    let attempts = max_retries.max(1);
    let mut attempt = 0;
    loop {
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(e) if !e.is_retryable() => return Err(Error::Provider(e)),
            Err(e) => {
                if attempt + 1 >= attempts {
                    return Err(Error::RetriesExhausted { attempts, source: e });
                }
                let delay = backoff_delay(attempt);
                warn!(
                    attempt = attempt + 1,
                    of = attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Model call failed, retrying"
                );
                tokio::select! {
                    _ = cancel.cancelled() => return Err(Error::Cancelled),
                    _ = sleeper.sleep(delay) => {}
                }
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::RecordingSleeper;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn flaky(fail_times: u32, calls: &AtomicU32) -> impl FnMut(u32) -> std::future::Ready<std::result::Result<u32, ProviderError>> + '_ {
        move |attempt| {
            calls.fetch_add(1, Ordering::SeqCst);
            std::future::ready(if attempt < fail_times {
                Err(ProviderError::Network("connection reset".into()))
            } else {
                Ok(attempt)
            })
        }
    }

    #[test]
    fn delays_double() {
        assert_eq!(backoff_delay(0), Duration::from_millis(1000));
        assert_eq!(backoff_delay(1), Duration::from_millis(2000));
        assert_eq!(backoff_delay(3), Duration::from_millis(8000));
    }

    #[tokio::test]
    async fn transient_failures_are_invisible() {
        let sleeper = RecordingSleeper::default();
        let calls = AtomicU32::new(0);
        let value = with_retries(3, &sleeper, &CancellationToken::new(), flaky(2, &calls))
            .await
            .unwrap();
        assert_eq!(value, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(sleeper.delays_ms(), vec![1000, 2000]);
    }

    #[tokio::test]
    async fn exhaustion_is_fatal() {
        let sleeper = RecordingSleeper::default();
        let calls = AtomicU32::new(0);
        let err = with_retries(3, &sleeper, &CancellationToken::new(), flaky(10, &calls))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::RetriesExhausted { attempts: 3, .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(sleeper.delays_ms(), vec![1000, 2000]);
    }

    #[tokio::test]
    async fn zero_retries_still_tries_once() {
        let sleeper = RecordingSleeper::default();
        let calls = AtomicU32::new(0);
        let err = with_retries(0, &sleeper, &CancellationToken::new(), flaky(10, &calls))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::RetriesExhausted { attempts: 1, .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(sleeper.delays_ms().is_empty());
    }

    #[tokio::test]
    async fn non_retryable_fails_immediately() {
        let sleeper = RecordingSleeper::default();
        let err = with_retries(5, &sleeper, &CancellationToken::new(), |_| {
            std::future::ready(Err::<(), _>(ProviderError::AuthenticationFailed("bad key".into())))
        })
        .await
        .unwrap_err();
        assert!(matches!(err, Error::Provider(ProviderError::AuthenticationFailed(_))));
        assert!(sleeper.delays_ms().is_empty());
    }

    #[tokio::test]
    async fn cancellation_interrupts_backoff() {
        struct CancellingSleeper(CancellationToken);

        #[async_trait]
        impl Sleeper for CancellingSleeper {
            async fn sleep(&self, _duration: Duration) {
                self.0.cancel();
                std::future::pending::<()>().await;
            }
        }

        let cancel = CancellationToken::new();
        let sleeper = CancellingSleeper(cancel.clone());
        let calls = AtomicU32::new(0);
        let err = with_retries(3, &sleeper, &cancel, flaky(10, &calls))
            .await
            .unwrap_err();
        assert!(err.is_cancelled());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn tokio_sleeper_waits() {
        let start = tokio::time::Instant::now();
        TokioSleeper.sleep(Duration::from_millis(1500)).await;
        assert!(start.elapsed() >= Duration::from_millis(1500));
    }
}

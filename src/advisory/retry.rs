//! Retry with exponential backoff and jitter for advisory lookups.

use std::future::Future;
use std::time::{Duration, SystemTime};

use tracing::{debug, warn};

use super::LookupError;

/// Backoff parameters for transient lookup failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt; `0` disables retrying.
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
            jitter: true,
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `retry` (1-based).
    ///
    /// Doubles from `base_delay` up to `max_delay`. With jitter enabled the
    /// delay lands in the upper half of that value, chosen by `entropy`.
    pub fn delay_for(&self, retry: u32, entropy: u64) -> Duration {
        let factor = 2u32.saturating_pow(retry.saturating_sub(1));
        let delay = self.base_delay.saturating_mul(factor).min(self.max_delay);
        if !self.jitter || delay.is_zero() {
            return delay;
        }
        let half = delay / 2;
        let spread_ms = (delay - half).as_millis() as u64;
        half + Duration::from_millis(entropy % (spread_ms + 1))
    }
}

/// Runs `call` until it succeeds, fails permanently, or retries run out.
///
/// An attempt that exceeds `timeout` counts as a transient failure.
pub async fn with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    timeout: Option<Duration>,
    operation: &str,
    mut call: F,
) -> Result<T, LookupError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, LookupError>>,
{
    let mut retry = 0;

    loop {
        let result = match timeout {
            Some(limit) => match tokio::time::timeout(limit, call()).await {
                Ok(result) => result,
                Err(_) => Err(LookupError::Transient(format!(
                    "timed out after {}ms",
                    limit.as_millis()
                ))),
            },
            None => call().await,
        };

        let error = match result {
            Ok(value) => return Ok(value),
            Err(e) => e,
        };

        if !error.is_transient() {
            debug!(operation, error = %error, "not retrying");
            return Err(error);
        }
        if retry >= policy.max_retries {
            warn!(operation, attempts = retry + 1, error = %error, "giving up");
            return Err(error);
        }

        retry += 1;
        let delay = policy.delay_for(retry, entropy());
        warn!(
            operation,
            retry,
            max_retries = policy.max_retries,
            delay_ms = delay.as_millis() as u64,
            error = %error,
            "lookup failed, retrying"
        );
        tokio::time::sleep(delay).await;
    }
}

fn entropy() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.subsec_nanos() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(1),
            jitter: false,
        }
    }

    #[test]
    fn test_delay_doubles_up_to_ceiling() {
        let p = policy(5);
        assert_eq!(p.delay_for(1, 0), Duration::from_millis(100));
        assert_eq!(p.delay_for(2, 0), Duration::from_millis(200));
        assert_eq!(p.delay_for(3, 0), Duration::from_millis(400));
        assert_eq!(p.delay_for(4, 0), Duration::from_millis(800));
        assert_eq!(p.delay_for(5, 0), Duration::from_secs(1));
        assert_eq!(p.delay_for(40, 0), Duration::from_secs(1));
    }

    #[test]
    fn test_jitter_stays_in_upper_half() {
        let p = RetryPolicy {
            jitter: true,
            ..policy(3)
        };
        assert_eq!(p.delay_for(2, 0), Duration::from_millis(100));
        assert_eq!(p.delay_for(2, 100), Duration::from_millis(200));
        for entropy in [1, 37, 99, 12345, u64::MAX] {
            let d = p.delay_for(2, entropy);
            assert!(d >= Duration::from_millis(100) && d <= Duration::from_millis(200));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_transient_then_succeeds() {
        let attempts = Arc::new(AtomicUsize::new(0));

        let result = with_retry(&policy(3), None, "test", || {
            let attempts = Arc::clone(&attempts);
            async move {
                if attempts.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(LookupError::Transient("connection reset".into()))
                } else {
                    Ok(42)
                }
            }
        })
        .await;

        assert_eq!(result, Ok(42));
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_permanent_failure_is_not_retried() {
        let attempts = Arc::new(AtomicUsize::new(0));

        let result: Result<(), _> = with_retry(&policy(3), None, "test", || {
            let attempts = Arc::clone(&attempts);
            async move {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err(LookupError::Permanent("HTTP 400".into()))
            }
        })
        .await;

        assert_eq!(result, Err(LookupError::Permanent("HTTP 400".into())));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_ceiling() {
        let attempts = Arc::new(AtomicUsize::new(0));

        let result: Result<(), _> = with_retry(&policy(2), None, "test", || {
            let attempts = Arc::clone(&attempts);
            async move {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err(LookupError::Transient("HTTP 503".into()))
            }
        })
        .await;

        assert!(matches!(result, Err(LookupError::Transient(_))));
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_counts_as_transient() {
        let attempts = Arc::new(AtomicUsize::new(0));

        let result: Result<(), _> = with_retry(
            &policy(1),
            Some(Duration::from_secs(1)),
            "test",
            || {
                let attempts = Arc::clone(&attempts);
                async move {
                    attempts.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_secs(60)).await;
                    Ok(())
                }
            },
        )
        .await;

        match result {
            Err(LookupError::Transient(msg)) => assert!(msg.contains("timed out")),
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }
}

//! Exponential backoff for transient backend failures.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tracing::warn;

use super::ApiError;

/// Retry policy applied to every backend call.
///
/// Attempt `n` (1-based) that fails with a retryable error waits
/// `min(base_delay * multiplier^(n-1), max_delay)`, jittered into the upper
/// half of that window, before the next attempt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Delay after the first failure.
    pub base_delay: Duration,
    /// Upper bound for any single delay.
    pub max_delay: Duration,
    /// Growth factor between consecutive delays.
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(300),
            max_delay: Duration::from_secs(3),
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    #[must_use]
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Un-jittered delay after failed attempt `attempt` (1-based).
    #[must_use]
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt.saturating_sub(1)).unwrap_or(i32::MAX);
        let cap = self.max_delay.as_millis();
        #[allow(clippy::cast_precision_loss)]
        let scaled = self.base_delay.as_millis() as f64 * self.multiplier.max(1.0).powi(exponent);
        #[allow(
            clippy::cast_precision_loss,
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss
        )]
        let millis = if scaled.is_finite() && scaled < cap as f64 {
            scaled.round() as u128
        } else {
            cap
        };
        Duration::from_millis(u64::try_from(millis.min(cap)).unwrap_or(u64::MAX))
    }

    /// Jittered delay after failed attempt `attempt`, in `[backoff/2, backoff]`.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let full = self.backoff(attempt);
        let half = full / 2;
        let spread = u64::try_from((full - half).as_millis()).unwrap_or(u64::MAX);
        if spread == 0 {
            return full;
        }
        half + Duration::from_millis(rand::rng().random_range(0..=spread))
    }

    /// Run `op` until it succeeds, fails with a non-retryable error, or the
    /// attempts run out. The last error is returned.
    ///
    /// # Errors
    ///
    /// Returns the error of the final attempt.
    pub async fn run<T, F, Fut>(&self, operation: &str, op: F) -> Result<T, ApiError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        self.run_when(operation, ApiError::is_retryable, op).await
    }

    /// Like [`run`](Self::run), but only errors accepted by `should_retry`
    /// are retried.
    ///
    /// # Errors
    ///
    /// Returns the error of the final attempt.
    pub async fn run_when<T, F, Fut, P>(
        &self,
        operation: &str,
        should_retry: P,
        mut op: F,
    ) -> Result<T, ApiError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
        P: Fn(&ApiError) -> bool,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) if should_retry(&err) && attempt < max_attempts => {
                    let delay = self.delay_for(attempt);
                    warn!(
                        operation,
                        attempt,
                        max_attempts,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %err,
                        "Retrying backend call"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    fn fast() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(4),
            multiplier: 2.0,
        }
    }

    #[test]
    fn test_backoff_grows_and_caps() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(1), Duration::from_millis(300));
        assert_eq!(policy.backoff(2), Duration::from_millis(600));
        assert_eq!(policy.backoff(3), Duration::from_millis(1200));
        assert_eq!(policy.backoff(5), Duration::from_secs(3));
        assert_eq!(policy.backoff(40), Duration::from_secs(3));
    }

    #[test]
    fn test_delay_for_stays_in_window() {
        let policy = RetryPolicy::default();
        for attempt in 1..6 {
            let full = policy.backoff(attempt);
            for _ in 0..20 {
                let delay = policy.delay_for(attempt);
                assert!(delay <= full);
                assert!(delay >= full / 2);
            }
        }
    }

    #[tokio::test]
    async fn test_run_retries_transient_errors() {
        let calls = AtomicU32::new(0);
        let result = fast()
            .run("test", || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 {
                        Err(ApiError::Timeout)
                    } else {
                        Ok(n)
                    }
                }
            })
            .await;
        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_run_gives_up_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = fast()
            .run("test", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async {
                    Err(ApiError::Http {
                        status: 503,
                        body: String::new(),
                    })
                }
            })
            .await;
        assert_eq!(result.unwrap_err().status(), Some(503));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_run_does_not_retry_client_errors() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = fast()
            .run("test", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async {
                    Err(ApiError::Http {
                        status: 404,
                        body: String::new(),
                    })
                }
            })
            .await;
        assert!(result.unwrap_err().is_not_found());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_run_when_limits_retries_to_predicate() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = fast()
            .run_when("test", ApiError::is_connect, || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(ApiError::Timeout) }
            })
            .await;
        assert!(matches!(result.unwrap_err(), ApiError::Timeout));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let calls = AtomicU32::new(0);
        let result = fast()
            .run_when("test", ApiError::is_connect, || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n == 0 {
                        Err(ApiError::Connect("refused".to_string()))
                    } else {
                        Ok(n)
                    }
                }
            })
            .await;
        assert_eq!(result.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_no_retry_policy() {
        let calls = AtomicU32::new(0);
        let _: Result<(), _> = RetryPolicy::no_retry()
            .run("test", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(ApiError::Timeout) }
            })
            .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}

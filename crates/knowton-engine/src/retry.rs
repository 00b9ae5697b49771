//! Retry with exponential backoff for ledger calls.

use std::future::Future;
use std::time::Duration;

use knowton_traits::TraitError;
use tokio::time::{sleep, timeout};

/// Retry configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first.
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Maximum delay between retries.
    pub max_delay: Duration,
    /// Multiplier for exponential backoff.
    pub backoff_multiplier: f64,
    /// Add random jitter to delays.
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// A single attempt, no retries.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            backoff_multiplier: 1.0,
            jitter: false,
        }
    }

    /// Delay after the `attempt`-th failure (1-based).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1) as i32;
        let base_delay =
            self.initial_delay.as_millis() as f64 * self.backoff_multiplier.powi(exponent);
        let delay_ms = base_delay.min(self.max_delay.as_millis() as f64);

        let final_delay_ms = if self.jitter {
            // Add up to 25% jitter
            let jitter_factor = 1.0 + (rand_jitter() * 0.25);
            delay_ms * jitter_factor
        } else {
            delay_ms
        };

        Duration::from_millis(final_delay_ms as u64)
    }

    /// Executes `f` with a per-attempt timeout, retrying retryable errors.
    ///
    /// Non-retryable errors are returned immediately. A timed-out attempt
    /// counts as [`TraitError::Timeout`].
    pub async fn execute<F, Fut, T>(
        &self,
        operation: &str,
        attempt_timeout: Duration,
        mut f: F,
    ) -> Result<T, TraitError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, TraitError>>,
    {
        let mut attempt = 0;

        loop {
            let result = match timeout(attempt_timeout, f()).await {
                Ok(result) => result,
                Err(_) => Err(TraitError::Timeout),
            };

            match result {
                Ok(value) => return Ok(value),
                Err(e) if !e.is_retryable() => {
                    tracing::debug!(operation, error = %e, "Non-retryable error");
                    return Err(e);
                }
                Err(e) => {
                    attempt += 1;
                    if attempt >= self.max_attempts {
                        tracing::warn!(
                            operation,
                            attempt,
                            max_attempts = self.max_attempts,
                            error = %e,
                            "All retry attempts exhausted"
                        );
                        return Err(e);
                    }

                    let delay = self.delay_for_attempt(attempt);
                    tracing::debug!(
                        operation,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Retrying after delay"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}

fn rand_jitter() -> f64 {
    // Use current time nanoseconds for simple randomness
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or(0);
    (nanos % 1000) as f64 / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast(max_attempts: u32) -> RetryConfig {
        RetryConfig {
            max_attempts,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            backoff_multiplier: 1.0,
            jitter: false,
        }
    }

    #[test]
    fn test_backoff_schedule() {
        let config = RetryConfig {
            jitter: false,
            ..RetryConfig::default()
        };
        assert_eq!(config.delay_for_attempt(1), Duration::from_secs(1));
        assert_eq!(config.delay_for_attempt(2), Duration::from_secs(2));
        assert_eq!(config.delay_for_attempt(3), Duration::from_secs(4));
        assert_eq!(config.delay_for_attempt(10), Duration::from_secs(30));
    }

    #[test]
    fn test_jitter_bounded() {
        let config = RetryConfig::default();
        let d = config.delay_for_attempt(1);
        assert!(d >= Duration::from_secs(1));
        assert!(d <= Duration::from_millis(1250));
    }

    #[tokio::test]
    async fn test_retries_transient_errors() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result = fast(3)
            .execute("invest", Duration::from_secs(1), move || async move {
                if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(TraitError::ConnectionFailed("connection refused".into()))
                } else {
                    Ok(7)
                }
            })
            .await;
        assert_eq!(result, Ok(7));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: Result<(), _> = fast(3)
            .execute("invest", Duration::from_secs(1), move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(TraitError::RateLimited)
            })
            .await;
        assert_eq!(result, Err(TraitError::RateLimited));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_non_retryable_not_repeated() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: Result<(), _> = fast(5)
            .execute("invest", Duration::from_secs(1), move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(TraitError::Reverted("allocation exceeded".into()))
            })
            .await;
        assert!(matches!(result, Err(TraitError::Reverted(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_attempt_timeout_is_retryable() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result = fast(2)
            .execute("issue_bond", Duration::from_millis(20), move || async move {
                if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                    sleep(Duration::from_secs(60)).await;
                }
                Ok::<_, TraitError>("ok")
            })
            .await;
        assert_eq!(result, Ok("ok"));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}

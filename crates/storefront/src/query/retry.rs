//! Retry policies for backend queries.

use std::future::Future;
use std::time::Duration;

use tracing::debug;

use crate::backend::{BackendError, BackendResult};

/// Delay between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDelay {
    /// The same delay before every retry.
    Fixed(Duration),
    /// `step * attempt`.
    Linear(Duration),
    /// `base * 2^(attempt - 1)`, never more than `cap`.
    CappedExponential { base: Duration, cap: Duration },
}

/// Which failures are retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryOn {
    /// Every error.
    Any,
    /// Only transport and availability errors.
    Transient,
}

/// How often and how patiently a failing query is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    pub delay: RetryDelay,
    pub retry_on: RetryOn,
}

impl RetryPolicy {
    /// Never retry.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            max_retries: 0,
            delay: RetryDelay::Fixed(Duration::ZERO),
            retry_on: RetryOn::Any,
        }
    }

    /// Admin role check: two retries, 500 ms apart.
    #[must_use]
    pub const fn admin_check() -> Self {
        Self {
            max_retries: 2,
            delay: RetryDelay::Fixed(Duration::from_millis(500)),
            retry_on: RetryOn::Any,
        }
    }

    /// Transient failures only, backing off from 200 ms to at most 2 s.
    #[must_use]
    pub const fn transient() -> Self {
        Self {
            max_retries: 2,
            delay: RetryDelay::CappedExponential {
                base: Duration::from_millis(200),
                cap: Duration::from_secs(2),
            },
            retry_on: RetryOn::Transient,
        }
    }

    /// Delay before retry number `attempt` (1-based).
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let attempt = attempt.max(1);
        match self.delay {
            RetryDelay::Fixed(delay) => delay,
            RetryDelay::Linear(step) => step.saturating_mul(attempt),
            RetryDelay::CappedExponential { base, cap } => {
                let factor = 2u32.saturating_pow(attempt - 1);
                base.saturating_mul(factor).min(cap)
            }
        }
    }

    /// Whether `error` may be retried after `attempt` retries so far.
    #[must_use]
    pub fn should_retry(&self, attempt: u32, error: &BackendError) -> bool {
        attempt < self.max_retries
            && match self.retry_on {
                RetryOn::Any => true,
                RetryOn::Transient => error.is_transient(),
            }
    }

    /// Run `operation`, retrying per this policy.
    ///
    /// # Errors
    ///
    /// Returns the last error once retries are exhausted or the error is not
    /// retryable.
    pub async fn run<T, F, Fut>(&self, mut operation: F) -> BackendResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = BackendResult<T>>,
    {
        let mut retries = 0;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) if self.should_retry(retries, &e) => {
                    retries += 1;
                    let delay = self.delay_for(retries);
                    debug!(error = %e, retry = retries, delay_ms = delay.as_millis(), "Retrying query");
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::transient()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    #[test]
    fn test_delays() {
        let fixed = RetryPolicy::admin_check();
        assert_eq!(fixed.delay_for(1), Duration::from_millis(500));
        assert_eq!(fixed.delay_for(2), Duration::from_millis(500));

        let linear = RetryPolicy {
            delay: RetryDelay::Linear(Duration::from_millis(100)),
            ..RetryPolicy::none()
        };
        assert_eq!(linear.delay_for(3), Duration::from_millis(300));

        let exp = RetryPolicy::transient();
        assert_eq!(exp.delay_for(1), Duration::from_millis(200));
        assert_eq!(exp.delay_for(2), Duration::from_millis(400));
        assert_eq!(exp.delay_for(4), Duration::from_millis(1600));
        assert_eq!(exp.delay_for(5), Duration::from_secs(2));
        assert_eq!(exp.delay_for(40), Duration::from_secs(2));
    }

    #[test]
    fn test_should_retry() {
        let transient = RetryPolicy::transient();
        assert!(transient.should_retry(0, &BackendError::NotReady));
        assert!(!transient.should_retry(2, &BackendError::NotReady));
        assert!(!transient.should_retry(0, &BackendError::Rejected("x".to_string())));

        let any = RetryPolicy::admin_check();
        assert!(any.should_retry(1, &BackendError::Rejected("x".to_string())));
        assert!(!RetryPolicy::none().should_retry(0, &BackendError::NotReady));
    }

    #[tokio::test]
    async fn test_run_retries_until_success() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let policy = RetryPolicy {
            max_retries: 3,
            delay: RetryDelay::Fixed(Duration::from_millis(1)),
            retry_on: RetryOn::Any,
        };

        let value = policy
            .run(|| async move {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(BackendError::NotReady)
                } else {
                    Ok(7)
                }
            })
            .await
            .unwrap();

        assert_eq!(value, 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_run_gives_up() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let policy = RetryPolicy {
            max_retries: 2,
            delay: RetryDelay::Fixed(Duration::from_millis(1)),
            retry_on: RetryOn::Any,
        };

        let result: BackendResult<()> = policy
            .run(|| async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(BackendError::NotReady)
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}

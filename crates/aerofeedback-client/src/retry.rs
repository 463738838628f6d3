//! Retry with exponential backoff
//!
//! A small, general utility: run an async operation up to `max_attempts`
//! times, bounding each attempt with a timeout, sleeping `base_delay * 2^n`
//! after the `n`-th (zero-based) failed attempt, and giving up early on
//! errors the caller marks as permanent or when the cancellation token
//! fires.

use aerofeedback_core::config::RetryConfig;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// How often and how patiently to retry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first
    pub max_attempts: u32,
    /// Delay after the first failed attempt; doubles each time
    pub base_delay: Duration,
    /// Upper bound on a single attempt
    pub attempt_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

impl RetryPolicy {
    /// Create a policy
    pub const fn new(max_attempts: u32, base_delay: Duration, attempt_timeout: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
            attempt_timeout,
        }
    }

    /// Build a policy from the retry configuration section
    pub const fn from_config(config: &RetryConfig) -> Self {
        Self::new(
            config.max_attempts,
            config.base_delay(),
            config.attempt_timeout(),
        )
    }

    /// Delay to wait after the zero-based `failed_attempt`
    ///
    /// Saturates at [`Duration::MAX`] once the delay no longer fits.
    pub fn backoff(&self, failed_attempt: u32) -> Duration {
        2_u32
            .checked_pow(failed_attempt)
            .and_then(|factor| self.base_delay.checked_mul(factor))
            .unwrap_or(Duration::MAX)
    }
}

/// Why a single attempt did not succeed
#[derive(Debug)]
pub enum AttemptFailure<E> {
    /// The attempt exceeded the policy's timeout and was dropped
    TimedOut(Duration),
    /// The operation returned an error
    Failed(E),
}

/// Why the whole retry loop gave up
#[derive(Debug)]
pub enum RetryError<E> {
    /// Every attempt failed with a retryable outcome
    Exhausted {
        /// Attempts made
        attempts: u32,
        /// Outcome of the final attempt
        last: AttemptFailure<E>,
    },
    /// An attempt failed with an error the predicate refused to retry
    Aborted {
        /// One-based attempt that failed
        attempt: u32,
        /// The error
        error: E,
    },
    /// The cancellation token fired
    Cancelled {
        /// Attempts started before cancellation
        attempts: u32,
    },
}

/// Run `operation` under `policy`.
///
/// `operation` receives the one-based attempt number. Attempt timeouts are
/// always retryable; operation errors are retried only when `is_retryable`
/// returns `true`.
pub async fn retry_with_backoff<T, E, F, Fut, P>(
    policy: &RetryPolicy,
    cancel: &CancellationToken,
    is_retryable: P,
    mut operation: F,
) -> Result<T, RetryError<E>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;
        debug!(attempt, max_attempts, "Starting attempt");

        let outcome = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                return Err(RetryError::Cancelled { attempts: attempt - 1 });
            }
            outcome = tokio::time::timeout(policy.attempt_timeout, operation(attempt)) => outcome,
        };

        let failure = match outcome {
            Ok(Ok(value)) => {
                debug!(attempt, "Attempt succeeded");
                return Ok(value);
            }
            Ok(Err(error)) if !is_retryable(&error) => {
                debug!(attempt, "Attempt failed with a permanent error");
                return Err(RetryError::Aborted { attempt, error });
            }
            Ok(Err(error)) => AttemptFailure::Failed(error),
            Err(_) => AttemptFailure::TimedOut(policy.attempt_timeout),
        };

        if attempt >= max_attempts {
            warn!(attempts = attempt, "Giving up after final attempt");
            return Err(RetryError::Exhausted {
                attempts: attempt,
                last: failure,
            });
        }

        let delay = policy.backoff(attempt - 1);
        warn!(
            attempt,
            max_attempts,
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            timed_out = matches!(failure, AttemptFailure::TimedOut(_)),
            "Attempt failed, backing off"
        );

        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                return Err(RetryError::Cancelled { attempts: attempt });
            }
            () = tokio::time::sleep(delay) => {}
        }
    }
}

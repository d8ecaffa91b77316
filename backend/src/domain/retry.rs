//! Bounded retry for transient storage contention.
//!
//! Operations are re-run from scratch on each attempt, so every attempt
//! acquires and releases its own storage handle.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

/// Retry configuration for ledger writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum attempts including the first call. Values below one are
    /// treated as one.
    pub max_attempts: u32,
    /// Fixed pause between attempts.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_millis(50),
        }
    }
}

/// Async clock-independent sleeping abstraction for retries.
#[async_trait]
pub trait RetrySleeper: Send + Sync {
    /// Pause for `duration`.
    async fn sleep(&self, duration: Duration);
}

/// Tokio-based sleeper implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl RetrySleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Failure returned by [`with_retry`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryError<E> {
    /// A transient failure persisted through every attempt.
    Exhausted { attempts: u32, last: E },
    /// A failure that retrying cannot fix.
    Permanent(E),
}

/// Run `operation` until it succeeds, fails permanently, or exhausts the
/// policy. `is_transient` decides which failures are retried.
///
/// # Examples
/// ```
/// use std::sync::atomic::{AtomicU32, Ordering};
/// use std::time::Duration;
///
/// use rental_ledger::domain::{RetryPolicy, TokioSleeper, with_retry};
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let counter = AtomicU32::new(0);
/// let calls = &counter;
/// let policy = RetryPolicy { max_attempts: 3, delay: Duration::ZERO };
/// let result = with_retry(&policy, &TokioSleeper, |_: &&str| true, || async move {
///     if calls.fetch_add(1, Ordering::SeqCst) == 0 { Err("busy") } else { Ok(7) }
/// })
/// .await;
/// assert_eq!(result, Ok(7));
/// # });
/// ```
pub async fn with_retry<T, E, F, Fut>(
    policy: &RetryPolicy,
    sleeper: &dyn RetrySleeper,
    is_transient: impl Fn(&E) -> bool,
    mut operation: F,
) -> Result<T, RetryError<E>>
where
    E: std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(error) if !is_transient(&error) => return Err(RetryError::Permanent(error)),
            Err(error) if attempt >= max_attempts => {
                return Err(RetryError::Exhausted {
                    attempts: attempt,
                    last: error,
                });
            }
            Err(error) => {
                warn!(
                    attempt,
                    max_attempts,
                    delay_ms = u64::try_from(policy.delay.as_millis()).unwrap_or(u64::MAX),
                    %error,
                    "transient storage failure; retrying"
                );
                sleeper.sleep(policy.delay).await;
                attempt += 1;
            }
        }
    }
}

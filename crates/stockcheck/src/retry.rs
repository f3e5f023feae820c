//! Bounded retry with a pause between attempts.
//!
//! A step reports its outcome as an [`Attempt`]; [`retry`] decides whether
//! to go again. Keeping the decision in the value means the combinator never
//! has to guess which errors a step considers recoverable.

use std::future::Future;
use std::time::Duration;

use crate::result::{E2eError, E2eResult};
use crate::wait::DEFAULT_RETRY_PAUSE_MS;

/// Outcome of one attempt
#[derive(Debug)]
pub enum Attempt<T> {
    /// Succeeded with a value
    Done(T),
    /// Failed, may succeed if tried again
    Retry(E2eError),
    /// Failed for good
    Fail(E2eError),
}

impl<T> Attempt<T> {
    /// Classify a result with [`E2eError::is_transient`].
    pub fn from_result(result: E2eResult<T>) -> Self {
        Self::classify(result, E2eError::is_transient)
    }

    /// Classify a result, retrying only staleness.
    pub fn retry_stale(result: E2eResult<T>) -> Self {
        Self::classify(result, |e| matches!(e, E2eError::StaleReference { .. }))
    }

    /// Classify a result with a custom predicate
    pub fn classify(result: E2eResult<T>, retryable: impl Fn(&E2eError) -> bool) -> Self {
        match result {
            Ok(value) => Self::Done(value),
            Err(e) if retryable(&e) => Self::Retry(e),
            Err(e) => Self::Fail(e),
        }
    }
}

/// How many attempts, and how long to pause between them
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub attempts: u32,
    /// Pause between attempts
    pub pause: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            pause: Duration::from_millis(DEFAULT_RETRY_PAUSE_MS),
        }
    }
}

impl RetryPolicy {
    /// Create a policy
    #[must_use]
    pub const fn new(attempts: u32, pause: Duration) -> Self {
        Self { attempts, pause }
    }

    /// `retries` retries after the first attempt
    #[must_use]
    pub const fn with_retries(retries: u32, pause: Duration) -> Self {
        Self::new(retries.saturating_add(1), pause)
    }

    /// Set pause between attempts
    #[must_use]
    pub const fn with_pause(mut self, pause: Duration) -> Self {
        self.pause = pause;
        self
    }
}

/// Run `step` until it is `Done` or `Fail`, or the attempts run out.
///
/// The step receives the 1-based attempt number. On exhaustion the error of
/// the last `Retry` is returned as is. A policy of zero attempts still runs
/// the step once.
pub async fn retry<T, F, Fut>(policy: &RetryPolicy, what: &str, mut step: F) -> E2eResult<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Attempt<T>>,
{
    let attempts = policy.attempts.max(1);
    let mut attempt = 1;
    loop {
        match step(attempt).await {
            Attempt::Done(value) => {
                if attempt > 1 {
                    tracing::debug!(what, attempt, "succeeded after retry");
                }
                return Ok(value);
            }
            Attempt::Fail(e) => return Err(e),
            Attempt::Retry(e) if attempt >= attempts => {
                tracing::warn!(what, attempts, error = %e, "retries exhausted");
                return Err(e);
            }
            Attempt::Retry(e) => {
                tracing::warn!(what, attempt, error = %e, "retrying");
                tokio::time::sleep(policy.pause).await;
                attempt += 1;
            }
        }
    }
}

//! Retry-on-conflict

use std::{fmt::Display, future::Future, time::Duration};

use tracing::warn;

/// Errors that can report a transaction conflict.
pub trait Retryable {
    /// Whether the failed unit of work may succeed if run again from scratch.
    fn is_conflict(&self) -> bool;
}

/// How often and how patiently a conflicted unit of work is re-run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Zero behaves like one.
    pub max_attempts: u32,

    /// Delay before the second attempt; grows linearly with each attempt.
    pub backoff: Duration,
}

impl RetryPolicy {
    /// Run exactly once.
    pub const NEVER: Self = Self {
        max_attempts: 1,
        backoff: Duration::ZERO,
    };
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            backoff: Duration::from_millis(25),
        }
    }
}

/// Run `operation` until it succeeds, fails with a non-conflict error, or
/// runs out of attempts.
///
/// Every attempt must open its own transaction so a retry starts from a
/// fresh snapshot.
///
/// # Errors
///
/// Returns the last error produced by `operation`.
pub async fn retry_on_conflict<T, E, F, Fut>(policy: RetryPolicy, mut operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Retryable + Display,
{
    let mut attempt: u32 = 1;

    loop {
        match operation().await {
            Err(error) if error.is_conflict() && attempt < policy.max_attempts => {
                warn!(
                    attempt,
                    max_attempts = policy.max_attempts,
                    "retrying after conflict: {error}"
                );

                tokio::time::sleep(policy.backoff.saturating_mul(attempt)).await;

                attempt += 1;
            }
            result => return result,
        }
    }
}

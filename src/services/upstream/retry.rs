//! Retry loop with linear backoff for upstream calls

use std::future::Future;
use std::time::Duration;

use crate::error::UpstreamError;

/// Retry policy for upstream calls
///
/// With the defaults a request makes at most four attempts, waiting 1s, 2s and
/// 3s between them. Combined with the 10s per-attempt timeout, which also
/// bounds the wait for a connection slot, the worst case for a single proxied
/// request is roughly 46 seconds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Additional attempts after the first one
    pub max_retries: u32,
    /// Delay unit; the wait before retry `k` is `k * step`
    pub step: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            step: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    /// Policy that never retries
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            step: Duration::ZERO,
        }
    }

    /// Delay before retry number `retry` (1-based)
    pub fn delay_for(&self, retry: u32) -> Duration {
        self.step * retry
    }

    /// Total attempts, including the first
    pub fn max_attempts(&self) -> u32 {
        self.max_retries + 1
    }
}

/// Suspends the current task between attempts
#[async_trait::async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Sleeps on the tokio timer
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

#[async_trait::async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Runs `f` until it succeeds, fails permanently, or the policy is exhausted
///
/// Only transient failures (network errors, timeouts, 5xx) are retried. The
/// last failure is returned once no attempts remain.
pub async fn with_retry<F, Fut, T>(
    policy: &RetryPolicy,
    sleeper: &dyn Sleeper,
    operation: &str,
    mut f: F,
) -> Result<T, UpstreamError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, UpstreamError>>,
{
    let mut attempt = 1u32;

    loop {
        match f().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                if !e.is_transient() {
                    return Err(e);
                }

                if attempt >= policy.max_attempts() {
                    tracing::warn!(
                        operation = operation,
                        attempts = attempt,
                        error = %e,
                        "Max retry attempts reached"
                    );
                    return Err(e);
                }

                let delay = policy.delay_for(attempt);
                tracing::info!(
                    operation = operation,
                    attempt = attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Attempt failed, retrying after backoff"
                );
                sleeper.sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

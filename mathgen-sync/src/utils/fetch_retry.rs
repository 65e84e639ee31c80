//! Bounded retry for transient remote failures
//!
//! Malformed or truncated pages and 5xx answers are repeated with exponential
//! backoff until `max_attempts` is reached. Everything else fails immediately.

use crate::error::{SyncError, SyncResult};
use crate::types::FetchError;
use mathgen_common::config::RemoteConfig;
use std::time::{Duration, Instant};

/// Retry ceiling and backoff bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl RetryPolicy {
    /// No waiting between attempts (tests, local mirrors)
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            initial_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RemoteConfig::default())
    }
}

impl From<&RemoteConfig> for RetryPolicy {
    fn from(config: &RemoteConfig) -> Self {
        Self {
            max_attempts: config.max_fetch_attempts.max(1),
            initial_backoff: Duration::from_millis(config.initial_backoff_ms),
            max_backoff: Duration::from_millis(config.max_backoff_ms),
        }
    }
}

/// Attempt `operation` until it succeeds, fails permanently, or the policy's
/// attempt ceiling is reached.
///
/// **Backoff Strategy:**
/// - Initial delay: `policy.initial_backoff`
/// - Multiplier: 2.0, capped at `policy.max_backoff`
///
/// `on_retry` is called once for every failed attempt that will be repeated.
///
/// # Returns
/// The operation's value, [`SyncError::FetchExhausted`] when transient
/// failures used up every attempt, or the permanent error mapped through
/// `From<FetchError>`.
pub async fn retry_transient<F, Fut, T>(
    operation_name: &str,
    policy: &RetryPolicy,
    mut on_retry: impl FnMut(),
    mut operation: F,
) -> SyncResult<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, FetchError>>,
{
    let start_time = Instant::now();
    let max_attempts = policy.max_attempts.max(1);
    let mut backoff = policy.initial_backoff;
    let mut attempt = 0;

    loop {
        attempt += 1;

        match operation().await {
            Ok(result) => {
                if attempt > 1 {
                    tracing::info!(
                        operation = operation_name,
                        attempt,
                        elapsed_ms = start_time.elapsed().as_millis(),
                        "Remote request succeeded after retry"
                    );
                }
                return Ok(result);
            }
            Err(err) if !err.is_transient() => return Err(err.into()),
            Err(err) => {
                if attempt >= max_attempts {
                    tracing::error!(
                        operation = operation_name,
                        attempt,
                        elapsed_ms = start_time.elapsed().as_millis(),
                        error = %err,
                        "Giving up: retry ceiling reached"
                    );
                    return Err(SyncError::FetchExhausted {
                        operation: operation_name.to_string(),
                        attempts: attempt,
                        last_error: err,
                    });
                }

                tracing::warn!(
                    operation = operation_name,
                    attempt,
                    max_attempts,
                    backoff_ms = backoff.as_millis(),
                    error = %err,
                    "Transient remote failure, will retry after backoff"
                );
                on_retry();

                if !backoff.is_zero() {
                    tokio::time::sleep(backoff).await;
                }
                backoff = (backoff * 2).min(policy.max_backoff);
            }
        }
    }
}

//! Throttling-aware retry policies.
//!
//! Only HTTP 429 responses are retried. The wait before a retry is the larger
//! of the server's `Retry-After` hint and the policy's own backoff table.

use super::transport::Attempt;
use crate::error::FetchError;
use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// How the default delay evolves between retries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// Doubles on every retry
    Exponential,
    /// Stays at the base delay
    Fixed,
}

/// Configuration for retry behavior on throttled responses
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of retries after the first attempt
    pub max_retries: u32,
    /// Default delay before the first retry
    pub base_delay: Duration,
    pub backoff: Backoff,
}

impl RetryPolicy {
    /// Policy for detail and top-list requests: 3 retries, 1s → 2s → 4s
    pub fn standard() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
            backoff: Backoff::Exponential,
        }
    }

    /// Policy for list pages: a single retry after a long cooldown
    pub fn list_cooldown(min_interval: Duration) -> Self {
        Self {
            max_retries: 1,
            base_delay: min_interval * 2,
            backoff: Backoff::Fixed,
        }
    }

    /// Exponential policy with custom budget and base delay
    pub fn exponential(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            backoff: Backoff::Exponential,
        }
    }

    /// Default delay before retry number `retry` (0-based)
    pub fn default_delay(&self, retry: u32) -> Duration {
        match self.backoff {
            Backoff::Exponential => self.base_delay.saturating_mul(2u32.saturating_pow(retry)),
            Backoff::Fixed => self.base_delay,
        }
    }

    /// Actual wait before retry number `retry`, honoring a server hint
    pub fn delay_for(&self, retry: u32, retry_after: Option<Duration>) -> Duration {
        let default = self.default_delay(retry);
        retry_after.map_or(default, |hint| hint.max(default))
    }

    /// Run `attempt` until it succeeds, fails, or the retry budget runs out
    ///
    /// Cancellation wins over everything else: once `token` fires, the loop
    /// stops at the next suspension point and reports `Cancelled`.
    pub async fn run<F, Fut>(&self, token: &CancellationToken, mut attempt: F) -> Result<Value, FetchError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Attempt, FetchError>>,
    {
        let mut retry = 0;

        loop {
            if token.is_cancelled() {
                return Err(FetchError::Cancelled);
            }

            let outcome = tokio::select! {
                biased;
                _ = token.cancelled() => return Err(FetchError::Cancelled),
                outcome = attempt() => outcome?,
            };

            let retry_after = match outcome {
                Attempt::Success(value) => return Ok(value),
                Attempt::Throttled { retry_after } => retry_after,
            };

            if retry >= self.max_retries {
                warn!(attempts = retry + 1, "Still rate limited, giving up");
                return Err(FetchError::Throttled { attempts: retry + 1 });
            }

            let delay = self.delay_for(retry, retry_after);
            warn!(
                retry = retry + 1,
                delay_ms = delay.as_millis(),
                server_hint_ms = retry_after.map(|d| d.as_millis()),
                "Rate limited by server, waiting"
            );

            tokio::select! {
                biased;
                _ = token.cancelled() => {
                    debug!("Cancelled during backoff");
                    return Err(FetchError::Cancelled);
                }
                _ = sleep(delay) => {}
            }

            retry += 1;
        }
    }
}

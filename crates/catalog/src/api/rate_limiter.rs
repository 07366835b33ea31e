//! Process-wide request pacing.
//!
//! Every outbound request, whatever view asked for it, passes through one
//! gate that keeps grants at least `min_interval` apart.

use crate::error::FetchError;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;

/// Minimum-interval rate limiter shared by all callers
#[derive(Debug)]
pub struct RateLimiter {
    /// Minimum spacing between two grants
    min_interval: Duration,
    /// Last grant; the lock is held for the whole wait so grants are issued one at a time
    last_grant: Mutex<Option<Instant>>,
    /// Grants issued so far
    grants: AtomicU64,
}

impl RateLimiter {
    /// Create a new rate limiter
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_grant: Mutex::new(None),
            grants: AtomicU64::new(0),
        }
    }

    /// Wait until a request can be made
    ///
    /// Waiters queue on the lock in arrival order. A caller whose token is
    /// cancelled while queued or sleeping leaves without consuming a grant.
    pub async fn acquire(&self, token: &CancellationToken) -> Result<Instant, FetchError> {
        let mut last_grant = tokio::select! {
            biased;
            _ = token.cancelled() => return Err(FetchError::Cancelled),
            guard = self.last_grant.lock() => guard,
        };

        if let Some(previous) = *last_grant {
            let ready_at = previous + self.min_interval;
            let now = Instant::now();

            if now < ready_at {
                tracing::debug!(
                    wait_ms = (ready_at - now).as_millis(),
                    "Rate limit: waiting for minimum interval"
                );
                tokio::select! {
                    biased;
                    _ = token.cancelled() => return Err(FetchError::Cancelled),
                    _ = sleep_until(ready_at) => {}
                }
            }
        }

        let granted_at = Instant::now();
        *last_grant = Some(granted_at);
        self.grants.fetch_add(1, Ordering::Relaxed);
        Ok(granted_at)
    }

    /// Number of grants issued since creation
    pub fn grants(&self) -> u64 {
        self.grants.load(Ordering::Relaxed)
    }
}

//! Single path for every outbound request.

use super::rate_limiter::RateLimiter;
use super::retry::RetryPolicy;
use super::transport::{Endpoint, Transport};
use crate::error::FetchError;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Paces, retries and decodes requests against a [`Transport`]
///
/// Every attempt, retries included, takes a grant from the shared
/// [`RateLimiter`] before reaching the transport.
#[derive(Clone)]
pub struct Gateway {
    transport: Arc<dyn Transport>,
    limiter: Arc<RateLimiter>,
}

impl Gateway {
    pub fn new(transport: Arc<dyn Transport>, limiter: Arc<RateLimiter>) -> Self {
        Self { transport, limiter }
    }

    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    pub async fn request<T: DeserializeOwned>(
        &self,
        endpoint: &Endpoint,
        policy: &RetryPolicy,
        token: &CancellationToken,
    ) -> Result<T, FetchError> {
        let limiter = &self.limiter;
        let transport = &self.transport;

        let value = policy
            .run(token, move || async move {
                limiter.acquire(token).await?;
                transport.send(endpoint).await
            })
            .await?;

        let decoded = serde_json::from_value(value).map_err(|e| {
            warn!(path = %endpoint.path(), error = %e, "Response is missing expected payload");
            FetchError::Malformed(e.to_string())
        })?;

        debug!(path = %endpoint.path(), "Response decoded");
        Ok(decoded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::transport::testing::ScriptedTransport;
    use crate::api::transport::Attempt;
    use crate::api::types::DataResponse;
    use serde_json::json;
    use std::time::Duration;

    fn gateway(transport: Arc<ScriptedTransport>) -> Gateway {
        Gateway::new(transport, Arc::new(RateLimiter::new(Duration::from_millis(1800))))
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_take_rate_limit_grants() {
        let transport = ScriptedTransport::new(|_, index| {
            if index == 0 {
                Ok(Attempt::Throttled { retry_after: None })
            } else {
                Ok(Attempt::Success(json!({ "data": [] })))
            }
        });
        let gateway = gateway(transport.clone());

        let response: DataResponse<serde_json::Value> = gateway
            .request(&Endpoint::Top { limit: 10 }, &RetryPolicy::standard(), &CancellationToken::new())
            .await
            .unwrap();

        assert!(response.data.is_empty());
        assert_eq!(gateway.limiter().grants(), 2);

        // Backoff is 1s, but the gate still enforces its full interval
        let times = transport.call_times();
        assert!(times[1] - times[0] >= Duration::from_millis(1800));
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_payload_is_malformed() {
        let transport = ScriptedTransport::new(|_, _| Ok(Attempt::Success(json!({ "status": 404 }))));

        let result: Result<DataResponse<serde_json::Value>, _> = gateway(transport)
            .request(&Endpoint::Top { limit: 10 }, &RetryPolicy::standard(), &CancellationToken::new())
            .await;

        assert!(matches!(result, Err(FetchError::Malformed(_))));
    }
}

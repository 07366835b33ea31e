//! Jikan API client.
//!
//! Performs single HTTP exchanges and classifies their outcome. Pacing and
//! retries are applied by the gateway, not here.

use super::transport::{Attempt, Endpoint, Transport};
use crate::error::FetchError;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use shared::config::ApiConfig;
use std::time::Duration;
use tracing::{debug, warn};

/// Jikan API v4 client
pub struct JikanClient {
    /// HTTP client
    client: Client,
    /// Base URL for Jikan API
    base_url: String,
}

impl JikanClient {
    /// Create a new Jikan client
    pub fn new(base_url: impl Into<String>, timeout: Duration, user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &ApiConfig) -> Result<Self> {
        Self::new(config.base_url.clone(), config.timeout(), &config.user_agent)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl Transport for JikanClient {
    async fn send(&self, endpoint: &Endpoint) -> Result<Attempt, FetchError> {
        let url = format!("{}{}", self.base_url, endpoint.path());
        debug!(url = %url, params = ?endpoint.query_params(), "Making API request");

        let response = self
            .client
            .get(&url)
            .query(&endpoint.query_params())
            .send()
            .await
            .map_err(|e| {
                warn!(url = %url, error = %e, "Request error");
                FetchError::Transport(e.to_string())
            })?;

        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = retry_after_hint(response.headers());
            debug!(url = %url, retry_after = ?retry_after, "Server answered 429");
            return Ok(Attempt::Throttled { retry_after });
        }

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());

            warn!(
                url = %url,
                status = %status,
                error = %error_text,
                "Request failed"
            );

            return Err(classify_status(status, &error_text));
        }

        match response.json::<Value>().await {
            Ok(data) => {
                debug!(url = %url, "Request successful");
                Ok(Attempt::Success(data))
            }
            Err(e) => {
                warn!(url = %url, error = %e, "Failed to parse response");
                Err(FetchError::Malformed(format!("invalid JSON body: {}", e)))
            }
        }
    }
}

/// Seconds-valued `Retry-After` header, if present and parseable
pub fn retry_after_hint(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

fn classify_status(status: StatusCode, body: &str) -> FetchError {
    if status == StatusCode::NOT_FOUND {
        FetchError::Malformed("resource not found".to_string())
    } else if status.is_server_error() {
        FetchError::Transport(format!("server error {}", status))
    } else {
        FetchError::Unknown(format!("status {}: {}", status, body))
    }
}

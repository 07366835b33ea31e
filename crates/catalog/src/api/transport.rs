//! Transport seam between the access layer and HTTP.

use crate::error::FetchError;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

/// Remote operation addressed by a single request
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// `GET /anime` (catalog listing when `query` is empty)
    Search { query: String, page: u32, limit: u32 },
    /// `GET /anime/{id}/full`
    Detail { id: u32 },
    /// `GET /top/anime`
    Top { limit: u32 },
}

impl Endpoint {
    pub fn path(&self) -> String {
        match self {
            Endpoint::Search { .. } => "/anime".to_string(),
            Endpoint::Detail { id } => format!("/anime/{}/full", id),
            Endpoint::Top { .. } => "/top/anime".to_string(),
        }
    }

    pub fn query_params(&self) -> Vec<(&'static str, String)> {
        match self {
            Endpoint::Search { query, page, limit } => {
                let mut params = vec![("page", page.to_string()), ("limit", limit.to_string())];
                if !query.is_empty() {
                    params.push(("q", query.clone()));
                }
                params
            }
            Endpoint::Detail { .. } => Vec::new(),
            Endpoint::Top { limit } => vec![("limit", limit.to_string())],
        }
    }
}

/// A response that reached the server and was not an error
#[derive(Debug, Clone, PartialEq)]
pub enum Attempt {
    Success(Value),
    /// HTTP 429, with the `Retry-After` hint when the server sent one
    Throttled { retry_after: Option<Duration> },
}

/// Performs one HTTP exchange; retrying and pacing happen above this layer
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, endpoint: &Endpoint) -> Result<Attempt, FetchError>;
}

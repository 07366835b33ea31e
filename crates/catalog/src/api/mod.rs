//! Jikan API v4 access.
//!
//! This module provides the transport seam, a reqwest-backed client, the
//! shared rate limiter, retry policies and the gateway tying them together.

pub mod client;
pub mod gateway;
pub mod rate_limiter;
pub mod retry;
pub mod transport;
pub mod types;

pub use client::JikanClient;
pub use gateway::Gateway;
pub use rate_limiter::RateLimiter;
pub use retry::{Backoff, RetryPolicy};
pub use transport::{Attempt, Endpoint, Transport};
pub use types::*;

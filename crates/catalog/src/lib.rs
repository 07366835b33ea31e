//! Anime catalog library for browsing the Jikan API v4.
//!
//! This library serves paginated, cached and session-scoped anime lists,
//! detail records and the top list, while keeping every request inside the
//! public API's rate limit.

pub mod api;
pub mod cache;
pub mod catalog;
pub mod debounce;
pub mod detail;
pub mod error;
pub mod fetcher;
pub mod session;

pub use api::{Endpoint, JikanClient, RateLimiter, RetryPolicy, Transport};
pub use cache::{CacheKey, CacheStore};
pub use catalog::{CatalogService, CatalogSettings, SearchInput};
pub use debounce::{CooldownGate, DebouncedQueryController};
pub use detail::{DetailFetcher, DetailOutcome, DetailSnapshot};
pub use error::FetchError;
pub use fetcher::{FetchOutcome, PaginatedFetcher, SearchSnapshot, SkipReason};
pub use session::{LoadState, SessionController, SessionId, SessionScope};

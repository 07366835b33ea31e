//! Catalog service.
//!
//! The one object views talk to. It wires a single rate limiter, cache and
//! session controller into the search and detail fetchers so that every
//! request the process makes shares the same pacing budget.

use crate::api::client::JikanClient;
use crate::api::gateway::Gateway;
use crate::api::rate_limiter::RateLimiter;
use crate::api::retry::RetryPolicy;
use crate::api::transport::{Endpoint, Transport};
use crate::api::types::{AnimeEntry, DataResponse};
use crate::cache::{CacheStats, CacheStore};
use crate::debounce::DebouncedQueryController;
use crate::detail::{DetailFetcher, DetailOutcome, DetailSnapshot};
use crate::error::FetchError;
use crate::fetcher::{FetchOutcome, FetcherSettings, PaginatedFetcher, SearchSnapshot};
use crate::session::{SessionController, SessionScope};
use anyhow::Result;
use shared::config::Config;
use shared::models::AnimeSummary;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Tunables for the catalog service
#[derive(Debug, Clone)]
pub struct CatalogSettings {
    pub page_limit: u32,
    pub top_limit: u32,
    /// Minimum spacing between any two outbound requests
    pub min_interval: Duration,
    /// Policy for detail and top-list requests
    pub retry: RetryPolicy,
    pub debounce: Duration,
    pub pagination_cooldown: Duration,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            page_limit: 24,
            top_limit: 10,
            min_interval: Duration::from_millis(1800),
            retry: RetryPolicy::standard(),
            debounce: Duration::from_millis(250),
            pagination_cooldown: Duration::from_millis(1200),
        }
    }
}

impl CatalogSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            page_limit: config.api.page_limit,
            top_limit: config.api.top_limit,
            min_interval: config.api.min_interval(),
            retry: RetryPolicy::exponential(config.api.retry.max_retries, config.api.retry_delay()),
            debounce: config.browse.debounce(),
            pagination_cooldown: config.browse.pagination_cooldown(),
        }
    }
}

pub struct CatalogService {
    gateway: Gateway,
    cache: Arc<CacheStore>,
    search: Arc<PaginatedFetcher>,
    detail: DetailFetcher,
    settings: CatalogSettings,
}

impl CatalogService {
    pub fn new(transport: Arc<dyn Transport>, settings: CatalogSettings) -> Self {
        let limiter = Arc::new(RateLimiter::new(settings.min_interval));
        let gateway = Gateway::new(transport, limiter);
        let cache = Arc::new(CacheStore::new());
        let sessions = Arc::new(SessionController::new());

        let search = Arc::new(PaginatedFetcher::new(
            gateway.clone(),
            cache.clone(),
            sessions.clone(),
            FetcherSettings {
                page_limit: settings.page_limit,
                pagination_cooldown: settings.pagination_cooldown,
                retry: RetryPolicy::list_cooldown(settings.min_interval),
            },
        ));
        let detail = DetailFetcher::new(gateway.clone(), sessions, settings.retry.clone());

        Self {
            gateway,
            cache,
            search,
            detail,
            settings,
        }
    }

    /// Build a service talking to the Jikan API described by `config`
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = JikanClient::from_config(&config.api)?;
        info!(base_url = client.base_url(), "Catalog service ready");
        Ok(Self::new(Arc::new(client), CatalogSettings::from_config(config)))
    }

    pub fn settings(&self) -> &CatalogSettings {
        &self.settings
    }

    pub async fn fetch_page(&self, query: &str, page: u32) -> FetchOutcome {
        self.search.fetch_page(query, page).await
    }

    pub async fn load_more(&self) -> FetchOutcome {
        self.search.load_more().await
    }

    pub async fn fetch_detail(&self, anime_id: u32) -> DetailOutcome {
        self.detail.fetch_detail(anime_id).await
    }

    /// One-shot top list; not cached and not tied to a session
    pub async fn fetch_top(&self) -> Result<Vec<AnimeSummary>, FetchError> {
        let endpoint = Endpoint::Top {
            limit: self.settings.top_limit,
        };
        let response: DataResponse<AnimeEntry> = self
            .gateway
            .request(&endpoint, &self.settings.retry, &CancellationToken::new())
            .await?;

        debug!(items = response.data.len(), "Fetched top list");
        Ok(response.data.into_iter().map(Into::into).collect())
    }

    /// Cancel the live session of `scope`; returns false if nothing was live
    pub fn cancel(&self, scope: SessionScope) -> bool {
        match scope {
            SessionScope::Search => self.search.cancel(),
            SessionScope::Detail => self.detail.cancel(),
        }
    }

    pub fn search_snapshot(&self) -> SearchSnapshot {
        self.search.snapshot()
    }

    pub fn detail_snapshot(&self) -> DetailSnapshot {
        self.detail.snapshot()
    }

    pub fn subscribe_search(&self) -> watch::Receiver<SearchSnapshot> {
        self.search.subscribe()
    }

    /// Debounced text input feeding the search session
    pub fn search_input(&self) -> SearchInput {
        let (controller, mut commits) = DebouncedQueryController::spawn(self.settings.debounce);
        let search = self.search.clone();

        let forward = tokio::spawn(async move {
            while let Some(query) = commits.recv().await {
                // Each commit runs on its own so a new query can supersede a slow one;
                // the fetcher drops commits matching its live query
                let search = search.clone();
                tokio::spawn(async move {
                    search.set_query(&query).await;
                });
            }
        });

        SearchInput { controller, forward }
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Rate limiter grants handed out so far
    pub fn requests_sent(&self) -> u64 {
        self.gateway.limiter().grants()
    }
}

/// Handle for typing into the search box; dropping it stops the debouncer
pub struct SearchInput {
    controller: DebouncedQueryController,
    forward: JoinHandle<()>,
}

impl SearchInput {
    pub fn push(&self, raw: impl Into<String>) {
        self.controller.push(raw);
    }
}

impl Drop for SearchInput {
    fn drop(&mut self) {
        self.forward.abort();
    }
}

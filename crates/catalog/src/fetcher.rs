//! Paginated search sessions.
//!
//! The fetcher owns the search list shown to the user. A session is one
//! query: page 1 replaces the list, every later page is appended, and pages
//! are merged strictly in order. Results that come back after their session
//! was superseded are discarded.

use crate::api::gateway::Gateway;
use crate::api::retry::RetryPolicy;
use crate::api::transport::Endpoint;
use crate::api::types::{AnimeEntry, PaginatedResponse};
use crate::cache::{CacheEntry, CacheKey, CacheStore};
use crate::debounce::CooldownGate;
use crate::error::FetchError;
use crate::session::{LoadState, SessionController, SessionId, SessionScope, SessionTicket};
use shared::models::AnimeSummary;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Settings for search sessions
#[derive(Debug, Clone)]
pub struct FetcherSettings {
    /// Items requested per page
    pub page_limit: u32,
    /// Minimum spacing between accepted next-page triggers
    pub pagination_cooldown: Duration,
    /// Retry policy for list requests
    pub retry: RetryPolicy,
}

impl Default for FetcherSettings {
    fn default() -> Self {
        Self {
            page_limit: 24,
            pagination_cooldown: Duration::from_millis(1200),
            retry: RetryPolicy::list_cooldown(Duration::from_millis(1800)),
        }
    }
}

/// What a search session looks like at one point in time
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SearchSnapshot {
    /// None until the first query is committed
    pub session: Option<SessionId>,
    pub query: String,
    pub page: u32,
    pub items: Vec<AnimeSummary>,
    pub has_next: bool,
    pub state: LoadState,
    pub error: Option<FetchError>,
}

/// Why a request did not start a fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// A fetch for this session is already outstanding
    Loading,
    /// The server reported no further pages
    Exhausted,
    /// Triggered again within the pagination cooldown
    Cooldown,
    /// The page is already merged or would leave a gap
    OutOfOrder,
    /// The query is already the committed one
    SameQuery,
    /// No live session to continue
    Inactive,
}

/// Result of a fetcher operation, as seen by the caller
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// The session changed; errors are reported through the snapshot
    Updated(SearchSnapshot),
    /// Nothing was fetched
    Skipped(SkipReason, SearchSnapshot),
    /// The session was superseded or cancelled before the result arrived
    Superseded,
}

impl FetchOutcome {
    pub fn snapshot(&self) -> Option<&SearchSnapshot> {
        match self {
            FetchOutcome::Updated(snapshot) | FetchOutcome::Skipped(_, snapshot) => Some(snapshot),
            FetchOutcome::Superseded => None,
        }
    }
}

#[derive(Debug, Default)]
struct SearchSession {
    ticket: Option<SessionTicket>,
    query: String,
    page: u32,
    /// Last page merged into `items`; the next page fetched is always `merged + 1`
    merged: u32,
    items: Vec<AnimeSummary>,
    has_next: bool,
    state: LoadState,
    error: Option<FetchError>,
}

impl SearchSession {
    fn started(ticket: SessionTicket, query: &str) -> Self {
        Self {
            ticket: Some(ticket),
            query: query.to_string(),
            page: 1,
            merged: 0,
            items: Vec::new(),
            has_next: true,
            state: LoadState::Loading,
            error: None,
        }
    }

    fn snapshot(&self) -> SearchSnapshot {
        SearchSnapshot {
            session: self.ticket.as_ref().map(SessionTicket::id),
            query: self.query.clone(),
            page: self.page,
            items: self.items.clone(),
            has_next: self.has_next,
            state: self.state,
            error: self.error.clone(),
        }
    }

    fn owns(&self, ticket: &SessionTicket) -> bool {
        self.ticket.as_ref().is_some_and(|t| t.id() == ticket.id())
    }

    fn merge(&mut self, page: u32, entry: &CacheEntry) {
        if page == 1 {
            self.items = entry.items.to_vec();
        } else {
            self.items.extend(entry.items.iter().cloned());
        }
        self.page = page;
        self.merged = page;
        self.has_next = entry.has_next;
        self.state = LoadState::Success;
        self.error = None;
    }
}

/// Serves the search list: cache, rate-limited fetch, ordered merge
pub struct PaginatedFetcher {
    gateway: Gateway,
    cache: Arc<CacheStore>,
    sessions: Arc<SessionController>,
    settings: FetcherSettings,
    state: Mutex<SearchSession>,
    cooldown: Mutex<CooldownGate>,
    updates: watch::Sender<SearchSnapshot>,
}

impl PaginatedFetcher {
    pub fn new(
        gateway: Gateway,
        cache: Arc<CacheStore>,
        sessions: Arc<SessionController>,
        settings: FetcherSettings,
    ) -> Self {
        let cooldown = CooldownGate::new(settings.pagination_cooldown);
        let (updates, _) = watch::channel(SearchSnapshot::default());

        Self {
            gateway,
            cache,
            sessions,
            settings,
            state: Mutex::new(SearchSession::default()),
            cooldown: Mutex::new(cooldown),
            updates,
        }
    }

    pub fn snapshot(&self) -> SearchSnapshot {
        self.lock_state().snapshot()
    }

    /// Receive a snapshot after every state change
    pub fn subscribe(&self) -> watch::Receiver<SearchSnapshot> {
        self.updates.subscribe()
    }

    /// Commit a query, starting a new session unless it is already live
    pub async fn set_query(&self, raw: &str) -> FetchOutcome {
        let query = raw.trim();
        {
            let state = self.lock_state();
            if state.query == query && self.is_live(&state) {
                debug!(query = query, "Query unchanged, keeping session");
                return FetchOutcome::Skipped(SkipReason::SameQuery, state.snapshot());
            }
        }
        self.restart(query).await
    }

    /// Fetch `page` of `query` into the search session
    ///
    /// A query other than the committed one (or a cancelled session) starts a
    /// new session at page 1 whatever page was asked for. Within the live
    /// session, page 1 refreshes the list and `merged + 1` appends; any other
    /// page is skipped so the list never has gaps.
    pub async fn fetch_page(&self, raw_query: &str, page: u32) -> FetchOutcome {
        let query = raw_query.trim();

        let fresh = {
            let state = self.lock_state();
            state.query != query || !self.is_live(&state)
        };
        if fresh {
            if page != 1 {
                debug!(query = query, page = page, "New session always starts at page 1");
            }
            return self.restart(query).await;
        }

        let ticket = {
            let mut state = self.lock_state();
            if state.query != query || !self.is_live(&state) {
                debug!(query = query, "Session replaced before the page request started");
                return FetchOutcome::Superseded;
            }
            if state.state == LoadState::Loading {
                return FetchOutcome::Skipped(SkipReason::Loading, state.snapshot());
            }
            if page != 1 && page != state.merged + 1 {
                debug!(page = page, merged = state.merged, "Ignoring out-of-order page request");
                return FetchOutcome::Skipped(SkipReason::OutOfOrder, state.snapshot());
            }
            if page != 1 && !state.has_next {
                return FetchOutcome::Skipped(SkipReason::Exhausted, state.snapshot());
            }

            match self.begin_load(&mut state) {
                Some(ticket) => ticket,
                None => return FetchOutcome::Skipped(SkipReason::Inactive, state.snapshot()),
            }
        };

        self.load(ticket, query, page).await
    }

    /// Next-page trigger from scroll proximity
    ///
    /// Ignored while loading, once the last page is reached, or within the
    /// pagination cooldown of the previous accepted trigger.
    pub async fn load_more(&self) -> FetchOutcome {
        let (ticket, query, page) = {
            let mut state = self.lock_state();
            if !self.is_live(&state) {
                return FetchOutcome::Skipped(SkipReason::Inactive, state.snapshot());
            }
            if state.state == LoadState::Loading {
                return FetchOutcome::Skipped(SkipReason::Loading, state.snapshot());
            }
            if !state.has_next {
                return FetchOutcome::Skipped(SkipReason::Exhausted, state.snapshot());
            }
            if !self.lock_cooldown().try_pass(Instant::now()) {
                debug!("Next-page trigger within cooldown");
                return FetchOutcome::Skipped(SkipReason::Cooldown, state.snapshot());
            }

            let page = state.merged + 1;
            match self.begin_load(&mut state) {
                Some(ticket) => (ticket, state.query.clone(), page),
                None => return FetchOutcome::Skipped(SkipReason::Inactive, state.snapshot()),
            }
        };

        self.load(ticket, &query, page).await
    }

    /// Cancel the search session; its pending result will be discarded
    pub fn cancel(&self) -> bool {
        let mut state = self.lock_state();
        if !self.sessions.cancel(SessionScope::Search) {
            return false;
        }

        if state.state == LoadState::Loading {
            state.state = if state.merged > 0 {
                LoadState::Success
            } else {
                LoadState::Idle
            };
        }
        self.publish(&state);
        true
    }

    async fn restart(&self, query: &str) -> FetchOutcome {
        let ticket = {
            let mut state = self.lock_state();
            // Begin under the state lock so concurrent restarts cannot interleave
            let ticket = self.sessions.begin(SessionScope::Search);
            *state = SearchSession::started(ticket.clone(), query);
            self.lock_cooldown().reset();
            self.publish(&state);
            ticket
        };

        info!(query = query, session = %ticket.id(), "Starting search session");
        self.load(ticket, query, 1).await
    }

    /// Mark the live session as loading and hand out its ticket
    fn begin_load(&self, state: &mut SearchSession) -> Option<SessionTicket> {
        let ticket = state.ticket.clone()?;
        state.state = LoadState::Loading;
        state.error = None;
        self.publish(state);
        Some(ticket)
    }

    async fn load(&self, ticket: SessionTicket, query: &str, page: u32) -> FetchOutcome {
        let key = CacheKey::new(query, page);

        let result = match self.cache.lookup(&key) {
            Some(entry) => Ok(entry),
            None => self.fetch_remote(key, query, page, ticket.token()).await,
        };

        self.apply(&ticket, page, result)
    }

    async fn fetch_remote(
        &self,
        key: CacheKey,
        query: &str,
        page: u32,
        token: &CancellationToken,
    ) -> Result<CacheEntry, FetchError> {
        let endpoint = Endpoint::Search {
            query: query.to_string(),
            page,
            limit: self.settings.page_limit,
        };

        let response: PaginatedResponse<AnimeEntry> =
            self.gateway.request(&endpoint, &self.settings.retry, token).await?;

        let has_next = response.has_next_page();
        let items: Vec<AnimeSummary> = response.data.into_iter().map(Into::into).collect();
        debug!(query = query, page = page, items = items.len(), has_next = has_next, "Fetched page");

        let entry = CacheEntry::new(items, has_next);
        self.cache.put(key, entry.clone());
        Ok(entry)
    }

    fn apply(
        &self,
        ticket: &SessionTicket,
        page: u32,
        result: Result<CacheEntry, FetchError>,
    ) -> FetchOutcome {
        let mut state = self.lock_state();

        if !state.owns(ticket) || !self.sessions.is_current(ticket) {
            debug!(session = %ticket.id(), page = page, "Discarding result of superseded session");
            return FetchOutcome::Superseded;
        }

        match result {
            Ok(entry) => {
                state.merge(page, &entry);
                debug!(
                    session = %ticket.id(),
                    page = page,
                    total = state.items.len(),
                    "Merged page"
                );
            }
            Err(error) if error.is_cancelled() => return FetchOutcome::Superseded,
            Err(error) => {
                warn!(session = %ticket.id(), page = page, error = %error, "Search fetch failed");
                state.state = LoadState::Error;
                state.error = Some(error);
            }
        }

        self.publish(&state);
        FetchOutcome::Updated(state.snapshot())
    }

    fn is_live(&self, state: &SearchSession) -> bool {
        state
            .ticket
            .as_ref()
            .is_some_and(|ticket| self.sessions.is_current(ticket))
    }

    fn publish(&self, state: &SearchSession) {
        self.updates.send_replace(state.snapshot());
    }

    fn lock_state(&self) -> MutexGuard<'_, SearchSession> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_cooldown(&self) -> MutexGuard<'_, CooldownGate> {
        self.cooldown.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::rate_limiter::RateLimiter;
    use crate::api::transport::testing::{search_page, ScriptedTransport};
    use crate::api::transport::Attempt;
    use serde_json::json;

    fn fetcher_with(transport: Arc<ScriptedTransport>, min_interval: Duration) -> PaginatedFetcher {
        let limiter = Arc::new(RateLimiter::new(min_interval));
        PaginatedFetcher::new(
            Gateway::new(transport, limiter),
            Arc::new(CacheStore::new()),
            Arc::new(SessionController::new()),
            FetcherSettings {
                retry: RetryPolicy::list_cooldown(min_interval),
                ..FetcherSettings::default()
            },
        )
    }

    fn fetcher(transport: Arc<ScriptedTransport>) -> PaginatedFetcher {
        fetcher_with(transport, Duration::from_millis(1800))
    }

    fn search(query: &str, page: u32) -> Endpoint {
        Endpoint::Search {
            query: query.to_string(),
            page,
            limit: 24,
        }
    }

    fn updated(outcome: FetchOutcome) -> SearchSnapshot {
        match outcome {
            FetchOutcome::Updated(snapshot) => snapshot,
            other => panic!("expected an update, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_pages_append_in_order() {
        let fetcher = fetcher(ScriptedTransport::catalog());

        let first = updated(fetcher.fetch_page("naruto", 1).await);
        assert_eq!(first.items.len(), 24);
        assert_eq!(first.page, 1);
        assert!(first.has_next);
        assert_eq!(first.state, LoadState::Success);

        let second = updated(fetcher.fetch_page("naruto", 2).await);
        assert_eq!(second.items.len(), 48);
        assert_eq!(second.page, 2);
        assert_eq!(second.items[..24], first.items[..]);
        let appended: Vec<u32> = second.items[24..].iter().map(|a| a.mal_id).collect();
        assert_eq!(appended, (2001..=2024).collect::<Vec<_>>());
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_query_replaces_list() {
        let transport = ScriptedTransport::catalog();
        let fetcher = Arc::new(fetcher(transport.clone()));

        fetcher.fetch_page("naruto", 1).await;
        fetcher.fetch_page("naruto", 2).await;

        let release = transport.hold(search("bleach", 1));
        let pending = {
            let fetcher = fetcher.clone();
            tokio::spawn(async move { fetcher.set_query("bleach").await })
        };
        tokio::time::sleep(Duration::from_secs(5)).await;

        let loading = fetcher.snapshot();
        assert_eq!(loading.query, "bleach");
        assert!(loading.items.is_empty());
        assert_eq!(loading.page, 1);
        assert!(loading.has_next);
        assert_eq!(loading.state, LoadState::Loading);
        assert_eq!(transport.calls().last(), Some(&search("bleach", 1)));

        release.notify_one();
        let done = updated(pending.await.unwrap());
        assert_eq!(done.items.len(), 24);
        assert!(done.items.iter().all(|a| a.title.starts_with("bleach")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cached_page_skips_rate_limiter() {
        let transport = ScriptedTransport::catalog();
        let fetcher = fetcher(transport.clone());

        let original = updated(fetcher.fetch_page("Naruto", 1).await);
        updated(fetcher.fetch_page("bleach", 1).await);
        assert_eq!(fetcher.gateway.limiter().grants(), 2);

        let start = Instant::now();
        let again = updated(fetcher.fetch_page("naruto ", 1).await);

        assert_eq!(again.items, original.items);
        assert_eq!(fetcher.gateway.limiter().grants(), 2);
        assert_eq!(transport.calls().len(), 2);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_superseded_result_is_discarded() {
        let transport = ScriptedTransport::catalog();
        let fetcher = Arc::new(fetcher(transport.clone()));

        let release = transport.hold(search("a", 1));
        let stale = {
            let fetcher = fetcher.clone();
            tokio::spawn(async move { fetcher.fetch_page("a", 1).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;

        let fresh = updated(fetcher.fetch_page("b", 1).await);
        release.notify_one();

        assert_eq!(stale.await.unwrap(), FetchOutcome::Superseded);
        assert_eq!(fetcher.snapshot(), fresh);
        assert_eq!(fresh.query, "b");
        assert!(fresh.items.iter().all(|a| a.title.starts_with("b ")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_superseded_error_is_discarded() {
        let transport = ScriptedTransport::new(|endpoint, _| match endpoint {
            Endpoint::Search { query, .. } if query == "a" => {
                Err(FetchError::Transport("connection reset".into()))
            }
            Endpoint::Search { query, page, .. } => Ok(Attempt::Success(search_page(query, *page, 3, false))),
            _ => Err(FetchError::Unknown("unexpected".into())),
        });
        let fetcher = Arc::new(fetcher(transport.clone()));

        let release = transport.hold(search("a", 1));
        let stale = {
            let fetcher = fetcher.clone();
            tokio::spawn(async move { fetcher.fetch_page("a", 1).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;

        let fresh = updated(fetcher.fetch_page("b", 1).await);
        release.notify_one();

        assert_eq!(stale.await.unwrap(), FetchOutcome::Superseded);
        let snapshot = fetcher.snapshot();
        assert_eq!(snapshot, fresh);
        assert_eq!(snapshot.error, None);
        assert_eq!(snapshot.state, LoadState::Success);
    }

    #[tokio::test(start_paused = true)]
    async fn test_next_page_guards() {
        let transport = ScriptedTransport::new(|endpoint, _| match endpoint {
            Endpoint::Search { query, page, .. } => {
                Ok(Attempt::Success(search_page(query, *page, 24, *page < 2)))
            }
            _ => Err(FetchError::Unknown("unexpected".into())),
        });
        let fetcher = Arc::new(fetcher_with(transport.clone(), Duration::ZERO));

        assert!(matches!(
            fetcher.load_more().await,
            FetchOutcome::Skipped(SkipReason::Inactive, _)
        ));

        updated(fetcher.fetch_page("naruto", 1).await);

        // Skipping page 2 is refused
        assert!(matches!(
            fetcher.fetch_page("naruto", 3).await,
            FetchOutcome::Skipped(SkipReason::OutOfOrder, _)
        ));

        let release = transport.hold(search("naruto", 2));
        let pending = {
            let fetcher = fetcher.clone();
            tokio::spawn(async move { fetcher.load_more().await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(matches!(
            fetcher.load_more().await,
            FetchOutcome::Skipped(SkipReason::Loading, _)
        ));

        release.notify_one();
        let second = updated(pending.await.unwrap());
        assert_eq!(second.items.len(), 48);
        assert!(!second.has_next);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(matches!(
            fetcher.load_more().await,
            FetchOutcome::Skipped(SkipReason::Exhausted, _)
        ));
        assert_eq!(transport.calls().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_scroll_triggers_respect_cooldown() {
        let fetcher = fetcher_with(ScriptedTransport::catalog(), Duration::ZERO);
        updated(fetcher.fetch_page("naruto", 1).await);

        assert_eq!(updated(fetcher.load_more().await).page, 2);
        assert!(matches!(
            fetcher.load_more().await,
            FetchOutcome::Skipped(SkipReason::Cooldown, _)
        ));

        tokio::time::sleep(Duration::from_millis(1200)).await;
        assert_eq!(updated(fetcher.load_more().await).page, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_throttling_sets_error_until_next_success() {
        let transport = ScriptedTransport::new(|endpoint, index| match endpoint {
            Endpoint::Search { query, page, .. } if index >= 2 => {
                Ok(Attempt::Success(search_page(query, *page, 24, true)))
            }
            _ => Ok(Attempt::Throttled { retry_after: None }),
        });
        let fetcher = fetcher(transport.clone());

        let failed = updated(fetcher.fetch_page("naruto", 1).await);
        assert_eq!(failed.state, LoadState::Error);
        assert_eq!(failed.error, Some(FetchError::Throttled { attempts: 2 }));
        assert!(failed.items.is_empty());

        // The retry waited the 2x interval cooldown
        let times = transport.call_times();
        assert!(times[1] - times[0] >= Duration::from_millis(3600));

        let recovered = updated(fetcher.fetch_page("naruto", 1).await);
        assert_eq!(recovered.state, LoadState::Success);
        assert_eq!(recovered.error, None);
        assert_eq!(recovered.items.len(), 24);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_page_is_retried_not_skipped() {
        let transport = ScriptedTransport::new(|endpoint, index| match endpoint {
            Endpoint::Search { page: 2, .. } if index == 1 => {
                Err(FetchError::Transport("timed out".into()))
            }
            Endpoint::Search { query, page, .. } => {
                Ok(Attempt::Success(search_page(query, *page, 24, true)))
            }
            _ => Err(FetchError::Unknown("unexpected".into())),
        });
        let fetcher = fetcher_with(transport.clone(), Duration::ZERO);

        updated(fetcher.fetch_page("naruto", 1).await);
        let failed = updated(fetcher.load_more().await);
        assert_eq!(failed.state, LoadState::Error);
        assert_eq!(failed.items.len(), 24);

        tokio::time::sleep(Duration::from_millis(1200)).await;
        let retried = updated(fetcher.load_more().await);
        assert_eq!(retried.page, 2);
        assert_eq!(retried.items.len(), 48);
        assert_eq!(transport.calls()[2], search("naruto", 2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_malformed_payload() {
        let transport = ScriptedTransport::new(|_, _| Ok(Attempt::Success(json!({ "message": "oops" }))));
        let fetcher = fetcher(transport);

        let snapshot = updated(fetcher.fetch_page("", 1).await);
        assert_eq!(snapshot.state, LoadState::Error);
        assert!(matches!(snapshot.error, Some(FetchError::Malformed(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_same_query_is_a_noop() {
        let transport = ScriptedTransport::catalog();
        let fetcher = fetcher(transport.clone());

        updated(fetcher.set_query("naruto").await);
        assert!(matches!(
            fetcher.set_query("  naruto ").await,
            FetchOutcome::Skipped(SkipReason::SameQuery, _)
        ));
        assert_eq!(transport.calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_discards_pending_and_allows_reentry() {
        let transport = ScriptedTransport::catalog();
        let fetcher = Arc::new(fetcher(transport.clone()));

        let release = transport.hold(search("naruto", 1));
        let pending = {
            let fetcher = fetcher.clone();
            tokio::spawn(async move { fetcher.fetch_page("naruto", 1).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert!(fetcher.cancel());
        release.notify_one();
        assert_eq!(pending.await.unwrap(), FetchOutcome::Superseded);
        assert_eq!(fetcher.snapshot().state, LoadState::Idle);

        // Re-entering the same query starts a fresh session
        transport.hold(search("naruto", 1)).notify_one();
        let fresh = updated(fetcher.fetch_page("naruto", 1).await);
        assert_eq!(fresh.items.len(), 24);
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscribers_see_updates() {
        let fetcher = fetcher(ScriptedTransport::catalog());
        let mut updates = fetcher.subscribe();

        fetcher.fetch_page("naruto", 1).await;

        assert!(updates.has_changed().unwrap());
        let latest = updates.borrow_and_update().clone();
        assert_eq!(latest.items.len(), 24);
        assert_eq!(latest.state, LoadState::Success);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_page_requests_run_on_worker_threads() {
        let fetcher = Arc::new(fetcher_with(ScriptedTransport::catalog(), Duration::ZERO));

        // Starts a session
        let first = {
            let fetcher = fetcher.clone();
            tokio::spawn(async move { fetcher.fetch_page("naruto", 1).await })
        };
        assert_eq!(updated(first.await.unwrap()).items.len(), 24);

        // Continues the live session
        let second = {
            let fetcher = fetcher.clone();
            tokio::spawn(async move { fetcher.fetch_page("naruto", 2).await })
        };
        assert_eq!(updated(second.await.unwrap()).items.len(), 48);

        let more = {
            let fetcher = fetcher.clone();
            tokio::spawn(async move { fetcher.load_more().await })
        };
        assert_eq!(updated(more.await.unwrap()).page, 3);
    }
}

//! Detail view sessions.
//!
//! Opening a detail view starts a new detail session and cancels the one
//! before it, so only the most recently opened anime can land in the view.
//! Details are not cached.

use crate::api::gateway::Gateway;
use crate::api::retry::RetryPolicy;
use crate::api::transport::Endpoint;
use crate::api::types::AnimeDetailsResponse;
use crate::error::FetchError;
use crate::session::{LoadState, SessionController, SessionId, SessionScope, SessionTicket};
use shared::models::AnimeDetail;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DetailSnapshot {
    pub session: Option<SessionId>,
    pub anime_id: Option<u32>,
    pub detail: Option<AnimeDetail>,
    pub state: LoadState,
    pub error: Option<FetchError>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DetailOutcome {
    Updated(DetailSnapshot),
    /// Another detail view was opened (or this one closed) first
    Superseded,
}

#[derive(Debug, Default)]
struct DetailSession {
    ticket: Option<SessionTicket>,
    anime_id: Option<u32>,
    detail: Option<AnimeDetail>,
    state: LoadState,
    error: Option<FetchError>,
}

impl DetailSession {
    fn snapshot(&self) -> DetailSnapshot {
        DetailSnapshot {
            session: self.ticket.as_ref().map(SessionTicket::id),
            anime_id: self.anime_id,
            detail: self.detail.clone(),
            state: self.state,
            error: self.error.clone(),
        }
    }
}

pub struct DetailFetcher {
    gateway: Gateway,
    sessions: Arc<SessionController>,
    retry: RetryPolicy,
    state: Mutex<DetailSession>,
}

impl DetailFetcher {
    pub fn new(gateway: Gateway, sessions: Arc<SessionController>, retry: RetryPolicy) -> Self {
        Self {
            gateway,
            sessions,
            retry,
            state: Mutex::new(DetailSession::default()),
        }
    }

    pub fn snapshot(&self) -> DetailSnapshot {
        self.lock_state().snapshot()
    }

    /// Load the full record of one anime into the detail view
    pub async fn fetch_detail(&self, anime_id: u32) -> DetailOutcome {
        let ticket = {
            let mut state = self.lock_state();
            let ticket = self.sessions.begin(SessionScope::Detail);
            *state = DetailSession {
                ticket: Some(ticket.clone()),
                anime_id: Some(anime_id),
                detail: None,
                state: LoadState::Loading,
                error: None,
            };
            ticket
        };

        info!(anime_id = anime_id, session = %ticket.id(), "Opening detail view");

        let result = self
            .gateway
            .request::<AnimeDetailsResponse>(&Endpoint::Detail { id: anime_id }, &self.retry, ticket.token())
            .await
            .map(|response| AnimeDetail::from(response.data));

        let mut state = self.lock_state();
        let owned = state.ticket.as_ref().is_some_and(|t| t.id() == ticket.id());
        if !owned || !self.sessions.is_current(&ticket) {
            debug!(anime_id = anime_id, session = %ticket.id(), "Discarding superseded detail");
            return DetailOutcome::Superseded;
        }

        match result {
            Ok(detail) => {
                state.detail = Some(detail);
                state.state = LoadState::Success;
            }
            Err(error) if error.is_cancelled() => return DetailOutcome::Superseded,
            Err(error) => {
                warn!(anime_id = anime_id, error = %error, "Detail fetch failed");
                state.state = LoadState::Error;
                state.error = Some(error);
            }
        }

        DetailOutcome::Updated(state.snapshot())
    }

    /// Close the detail view, dropping any pending result
    pub fn cancel(&self) -> bool {
        let mut state = self.lock_state();
        if !self.sessions.cancel(SessionScope::Detail) {
            return false;
        }
        if state.state == LoadState::Loading {
            state.state = LoadState::Idle;
        }
        true
    }

    fn lock_state(&self) -> MutexGuard<'_, DetailSession> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

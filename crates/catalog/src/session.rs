//! Session identity and cancellation.
//!
//! Each logical browsing intent (one query's list, one detail view) runs as a
//! session with its own cancellation token. Starting a session cancels the
//! previous one in the same scope; results that come back for a cancelled
//! session are dropped by whoever owns the session state.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Independent cancellation scopes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionScope {
    Search,
    Detail,
}

impl SessionScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionScope::Search => "search",
            SessionScope::Detail => "detail",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Lifecycle of a session's latest request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadState {
    #[default]
    Idle,
    Loading,
    Success,
    Error,
}

/// Handle to one session: identity plus its cancellation token
#[derive(Debug, Clone)]
pub struct SessionTicket {
    id: SessionId,
    scope: SessionScope,
    token: CancellationToken,
}

impl SessionTicket {
    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Tracks the current session of every scope
#[derive(Debug, Default)]
pub struct SessionController {
    current: Mutex<HashMap<SessionScope, SessionTicket>>,
    next_id: AtomicU64,
}

impl SessionController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new session in `scope`, cancelling the one it replaces
    pub fn begin(&self, scope: SessionScope) -> SessionTicket {
        let ticket = SessionTicket {
            id: SessionId(self.next_id.fetch_add(1, Ordering::Relaxed) + 1),
            scope,
            token: CancellationToken::new(),
        };

        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = current.insert(scope, ticket.clone()) {
            previous.token.cancel();
            debug!(
                scope = scope.as_str(),
                previous = %previous.id,
                next = %ticket.id,
                "Superseded session"
            );
        }

        ticket
    }

    /// Cancel the current session of `scope` without starting another
    ///
    /// Returns false if there was no live session to cancel.
    pub fn cancel(&self, scope: SessionScope) -> bool {
        let current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        match current.get(&scope) {
            Some(ticket) if !ticket.is_cancelled() => {
                ticket.token.cancel();
                debug!(scope = scope.as_str(), session = %ticket.id, "Cancelled session");
                true
            }
            _ => false,
        }
    }

    /// True while `ticket` is the live session of its scope
    pub fn is_current(&self, ticket: &SessionTicket) -> bool {
        if ticket.is_cancelled() {
            return false;
        }
        let current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        current
            .get(&ticket.scope)
            .is_some_and(|live| live.id == ticket.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_begin_supersedes_previous() {
        let sessions = SessionController::new();

        let first = sessions.begin(SessionScope::Search);
        assert!(sessions.is_current(&first));

        let second = sessions.begin(SessionScope::Search);
        assert!(first.is_cancelled());
        assert!(!sessions.is_current(&first));
        assert!(sessions.is_current(&second));
        assert!(second.id() > first.id());
    }

    #[test]
    fn test_scopes_are_independent() {
        let sessions = SessionController::new();

        let search = sessions.begin(SessionScope::Search);
        let detail = sessions.begin(SessionScope::Detail);
        let detail_again = sessions.begin(SessionScope::Detail);

        assert!(sessions.is_current(&search));
        assert!(!sessions.is_current(&detail));
        assert!(sessions.is_current(&detail_again));
    }

    #[test]
    fn test_cancel_scope() {
        let sessions = SessionController::new();
        assert!(!sessions.cancel(SessionScope::Detail));

        let detail = sessions.begin(SessionScope::Detail);
        assert!(sessions.cancel(SessionScope::Detail));
        assert!(detail.is_cancelled());
        assert!(!sessions.is_current(&detail));

        // Already cancelled
        assert!(!sessions.cancel(SessionScope::Detail));

        let reopened = sessions.begin(SessionScope::Detail);
        assert!(sessions.is_current(&reopened));
    }
}

//! Error taxonomy for catalog requests.

use thiserror::Error;

/// Why a catalog request did not produce data
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The owning session was superseded; never shown to users
    #[error("request cancelled")]
    Cancelled,

    #[error("rate limited by server after {attempts} attempts")]
    Throttled { attempts: u32 },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("unexpected error: {0}")]
    Unknown(String),
}

impl FetchError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, FetchError::Cancelled)
    }

    /// Message suitable for showing in a view
    pub fn user_message(&self) -> &'static str {
        match self {
            FetchError::Cancelled => "",
            FetchError::Throttled { .. } => "Too many requests, please try again in a moment.",
            FetchError::Transport(_) => "Could not reach the catalog service.",
            FetchError::Malformed(_) => "Not found.",
            FetchError::Unknown(_) => "Something went wrong.",
        }
    }
}

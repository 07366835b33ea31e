//! Data models for the anime catalog.
//!
//! These are the records handed to views and to the favorites store. They are
//! flattened from the Jikan payloads without further normalization.

use serde::{Deserialize, Serialize};

/// Compact anime record used by list views and the favorites store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimeSummary {
    pub mal_id: u32, // MyAnimeList ID
    pub title: String,
    pub score: Option<f64>,
    pub image_url: Option<String>,
    #[serde(default)]
    pub genres: Vec<String>,
    pub status: Option<String>,
}

/// Full anime record shown on the detail view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimeDetail {
    #[serde(flatten)]
    pub summary: AnimeSummary,

    pub synopsis: Option<String>,
    pub year: Option<u32>,
    pub episodes: Option<u32>,
    pub rating: Option<String>,

    #[serde(default)]
    pub studios: Vec<String>,
    #[serde(default)]
    pub streaming: Vec<StreamingLink>,
}

/// Where an anime can be watched
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamingLink {
    pub name: String,
    pub url: String,
}

impl AnimeSummary {
    /// One-line label used by list output
    pub fn label(&self) -> String {
        match self.score {
            Some(score) => format!("[{}] {} ({:.2})", self.mal_id, self.title, score),
            None => format!("[{}] {}", self.mal_id, self.title),
        }
    }
}

//! Jikan API v4 response types.
//!
//! These types represent the JSON responses from the Jikan API. Only the
//! fields the catalog shows are decoded; everything else is ignored.

use serde::Deserialize;
use shared::models::{AnimeDetail, AnimeSummary, StreamingLink};

/// Generic pagination wrapper
#[derive(Debug, Clone, Deserialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

impl<T> PaginatedResponse<T> {
    /// A missing pagination block means there is nothing further
    pub fn has_next_page(&self) -> bool {
        self.pagination.as_ref().is_some_and(|p| p.has_next_page)
    }
}

/// Simple data wrapper (without pagination)
#[derive(Debug, Clone, Deserialize)]
pub struct DataResponse<T> {
    pub data: Vec<T>,
}

/// Pagination metadata
#[derive(Debug, Clone, Deserialize)]
pub struct Pagination {
    pub has_next_page: bool,
}

/// Full anime details response
#[derive(Debug, Clone, Deserialize)]
pub struct AnimeDetailsResponse {
    pub data: AnimeFull,
}

/// Anime entry as returned by list endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct AnimeEntry {
    pub mal_id: u32,
    pub title: String,
    pub images: Option<AnimeImages>,
    pub score: Option<f64>,
    #[serde(default)]
    pub genres: Vec<MalEntity>,
    pub status: Option<String>,
}

/// Anime entry as returned by `/anime/{id}/full`
#[derive(Debug, Clone, Deserialize)]
pub struct AnimeFull {
    #[serde(flatten)]
    pub entry: AnimeEntry,
    pub synopsis: Option<String>,
    pub year: Option<u32>,
    pub episodes: Option<u32>,
    pub rating: Option<String>,
    #[serde(default)]
    pub studios: Vec<MalEntity>,
    #[serde(default)]
    pub streaming: Vec<StreamingEntry>,
}

/// Anime images
#[derive(Debug, Clone, Deserialize)]
pub struct AnimeImages {
    pub jpg: Option<ImageSet>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImageSet {
    pub image_url: Option<String>,
}

/// MAL entity (genre, studio, producer, etc.)
#[derive(Debug, Clone, Deserialize)]
pub struct MalEntity {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StreamingEntry {
    pub name: String,
    pub url: String,
}

impl From<AnimeEntry> for AnimeSummary {
    fn from(entry: AnimeEntry) -> Self {
        Self {
            mal_id: entry.mal_id,
            title: entry.title,
            score: entry.score,
            image_url: entry
                .images
                .and_then(|images| images.jpg)
                .and_then(|jpg| jpg.image_url),
            genres: entry.genres.into_iter().map(|g| g.name).collect(),
            status: entry.status,
        }
    }
}

impl From<AnimeFull> for AnimeDetail {
    fn from(full: AnimeFull) -> Self {
        Self {
            summary: full.entry.into(),
            synopsis: full.synopsis,
            year: full.year,
            episodes: full.episodes,
            rating: full.rating,
            studios: full.studios.into_iter().map(|s| s.name).collect(),
            streaming: full
                .streaming
                .into_iter()
                .map(|s| StreamingLink {
                    name: s.name,
                    url: s.url,
                })
                .collect(),
        }
    }
}

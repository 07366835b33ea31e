//! Favorites persistence.
//!
//! The favorites list is a single durable slot holding the whole list. It has
//! no interaction with the catalog cache or the rate limiter.

use crate::db::Database;
use crate::models::AnimeSummary;
use anyhow::{Context, Result};
use std::path::Path;
use tracing::{info, warn};

const FAVORITES_KEY: &str = "favorites";

/// Durable storage for the favorites list
pub trait FavoritesStore {
    /// Load the stored list, in insertion order
    fn get(&self) -> Result<Vec<AnimeSummary>>;

    /// Replace the stored list
    fn put(&self, items: &[AnimeSummary]) -> Result<()>;
}

/// SQLite-backed favorites store
pub struct SqliteFavorites {
    db: Database,
}

impl SqliteFavorites {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db = Database::open(path).context("Failed to open favorites database")?;
        Ok(Self { db })
    }

    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

impl FavoritesStore for SqliteFavorites {
    fn get(&self) -> Result<Vec<AnimeSummary>> {
        let Some(raw) = self.db.get_value(FAVORITES_KEY)? else {
            return Ok(Vec::new());
        };

        match serde_json::from_str(&raw) {
            Ok(items) => Ok(items),
            Err(e) => {
                warn!(error = %e, "Stored favorites are unreadable, starting empty");
                Ok(Vec::new())
            }
        }
    }

    fn put(&self, items: &[AnimeSummary]) -> Result<()> {
        let raw = serde_json::to_string(items).context("Failed to serialize favorites")?;
        self.db.set_value(FAVORITES_KEY, &raw)
    }
}

/// Add `anime` if it is not a favorite yet, remove it otherwise
///
/// Returns true when the anime is a favorite afterwards.
pub fn toggle_favorite(store: &impl FavoritesStore, anime: &AnimeSummary) -> Result<bool> {
    let mut items = store.get()?;
    let before = items.len();
    items.retain(|item| item.mal_id != anime.mal_id);

    let added = items.len() == before;
    if added {
        items.push(anime.clone());
    }

    store.put(&items)?;
    info!(mal_id = anime.mal_id, added = added, "Toggled favorite");
    Ok(added)
}

/// Check whether an anime is in the favorites list
pub fn is_favorite(store: &impl FavoritesStore, mal_id: u32) -> Result<bool> {
    Ok(store.get()?.iter().any(|item| item.mal_id == mal_id))
}

/// Remove every favorite
pub fn clear_favorites(store: &impl FavoritesStore) -> Result<()> {
    store.put(&[])
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn anime(mal_id: u32, title: &str) -> AnimeSummary {
        AnimeSummary {
            mal_id,
            title: title.to_string(),
            score: None,
            image_url: None,
            genres: Vec::new(),
            status: None,
        }
    }

    fn store() -> SqliteFavorites {
        SqliteFavorites::new(Database::open_in_memory().unwrap())
    }

    #[test]
    fn test_empty_store() -> Result<()> {
        let store = store();
        assert!(store.get()?.is_empty());
        assert!(!is_favorite(&store, 1)?);
        Ok(())
    }

    #[test]
    fn test_toggle_adds_then_removes() -> Result<()> {
        let store = store();

        assert!(toggle_favorite(&store, &anime(1, "Naruto"))?);
        assert!(toggle_favorite(&store, &anime(2, "Bleach"))?);
        assert_eq!(
            store.get()?.iter().map(|a| a.mal_id).collect::<Vec<_>>(),
            vec![1, 2]
        );

        assert!(!toggle_favorite(&store, &anime(1, "Naruto"))?);
        assert_eq!(store.get()?, vec![anime(2, "Bleach")]);
        assert!(!is_favorite(&store, 1)?);
        assert!(is_favorite(&store, 2)?);

        Ok(())
    }

    #[test]
    fn test_clear() -> Result<()> {
        let store = store();
        toggle_favorite(&store, &anime(1, "Naruto"))?;

        clear_favorites(&store)?;
        assert!(store.get()?.is_empty());

        Ok(())
    }

    #[test]
    fn test_unreadable_payload_yields_empty_list() -> Result<()> {
        let db = Database::open_in_memory()?;
        db.set_value(FAVORITES_KEY, "{not json")?;

        let store = SqliteFavorites::new(db);
        assert!(store.get()?.is_empty());

        Ok(())
    }

    #[test]
    fn test_persists_across_reopen() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("favorites.db");

        toggle_favorite(&SqliteFavorites::open(&path)?, &anime(5, "Monster"))?;

        let reopened = SqliteFavorites::open(&path)?;
        assert_eq!(reopened.get()?, vec![anime(5, "Monster")]);

        Ok(())
    }
}

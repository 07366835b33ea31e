//! In-memory page cache.
//!
//! Pages are memoized per (normalized query, page) for the lifetime of the
//! process so that revisiting a query never spends rate-limit budget twice.
//! Entries are write-once and never expire.

use chrono::{DateTime, Utc};
use shared::models::AnimeSummary;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

/// Identity of a cached page
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    query: String,
    page: u32,
}

impl CacheKey {
    /// Build a key; the query is trimmed, whitespace-collapsed and lowercased
    pub fn new(query: &str, page: u32) -> Self {
        let query = query
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();
        Self { query, page }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn page(&self) -> u32 {
        self.page
    }
}

/// One fetched page, immutable once stored
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub items: Arc<[AnimeSummary]>,
    pub has_next: bool,
    pub captured_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn new(items: Vec<AnimeSummary>, has_next: bool) -> Self {
        Self {
            items: items.into(),
            has_next,
            captured_at: Utc::now(),
        }
    }
}

/// Cache statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
}

/// Unbounded, process-lifetime page cache
#[derive(Debug, Default)]
pub struct CacheStore {
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl CacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a cached page if it exists
    pub fn lookup(&self, key: &CacheKey) -> Option<CacheEntry> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);

        match entries.get(key) {
            Some(entry) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!(
                    query = key.query(),
                    page = key.page(),
                    age_secs = (Utc::now() - entry.captured_at).num_seconds(),
                    "Cache hit"
                );
                Some(entry.clone())
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                debug!(query = key.query(), page = key.page(), "Cache miss");
                None
            }
        }
    }

    /// Store a page; returns false (and keeps the first entry) if the key is taken
    pub fn put(&self, key: CacheKey, entry: CacheEntry) -> bool {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);

        if entries.contains_key(&key) {
            debug!(query = key.query(), page = key.page(), "Cache entry already present");
            return false;
        }

        debug!(
            query = key.query(),
            page = key.page(),
            items = entry.items.len(),
            "Cache stored"
        );
        entries.insert(key, entry);
        true
    }

    fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

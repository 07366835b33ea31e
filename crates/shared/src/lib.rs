//! Shared library for the anime catalog workspace.
//!
//! This crate provides common functionality used by the catalog client and
//! its command-line front end:
//! - Configuration management
//! - Logging infrastructure
//! - Domain models
//! - Favorites persistence

pub mod config;
pub mod db;
pub mod favorites;
pub mod logging;
pub mod models;

// Re-export commonly used types
pub use config::Config;
pub use db::Database;
pub use favorites::{FavoritesStore, SqliteFavorites};
pub use logging::LogConfig;
pub use models::*;

/// Common result type using anyhow::Error
pub type Result<T> = anyhow::Result<T>;

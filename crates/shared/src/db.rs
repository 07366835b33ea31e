//! Database operations for SQLite.
//!
//! This module handles the connection and schema for the small key-value
//! store that backs client-side persistent state.

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use tracing::{debug, info};

const SCHEMA_VERSION: i32 = 1;

/// Database connection wrapper
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create a database at the given path
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create database directory: {}", parent.display()))?;
        }

        debug!(path = %path.display(), "Opening database");

        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database at {}", path.display()))?;

        let mut db = Self { conn };
        db.ensure_schema()?;
        Ok(db)
    }

    /// Open a throwaway in-memory database
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        let mut db = Self { conn };
        db.ensure_schema()?;
        Ok(db)
    }

    fn ensure_schema(&mut self) -> Result<()> {
        if self.get_version()? >= SCHEMA_VERSION {
            debug!("Database schema up to date");
            return Ok(());
        }

        info!("Creating database schema");
        self.conn
            .execute_batch(include_str!("../schema.sql"))
            .context("Failed to create database schema")?;
        self.set_version(SCHEMA_VERSION)?;

        info!("Database schema created successfully");
        Ok(())
    }

    /// Get the database version (from user_version pragma)
    pub fn get_version(&self) -> Result<i32> {
        let version: i32 = self
            .conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))?;
        Ok(version)
    }

    /// Set the database version
    pub fn set_version(&self, version: i32) -> Result<()> {
        self.conn
            .execute_batch(&format!("PRAGMA user_version = {}", version))?;
        Ok(())
    }

    /// Read the value stored under `key`
    pub fn get_value(&self, key: &str) -> Result<Option<String>> {
        self.conn
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .with_context(|| format!("Failed to read key '{}'", key))
    }

    /// Replace the value stored under `key`
    pub fn set_value(&self, key: &str, value: &str) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO kv_store (key, value, updated_at)
                 VALUES (?1, ?2, CURRENT_TIMESTAMP)
                 ON CONFLICT(key) DO UPDATE SET
                    value = excluded.value,
                    updated_at = excluded.updated_at",
                params![key, value],
            )
            .with_context(|| format!("Failed to write key '{}'", key))?;

        debug!(key = key, bytes = value.len(), "Stored value");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_create_database() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let db_path = temp_dir.path().join("nested").join("test.db");

        let db = Database::open(&db_path)?;
        assert!(db_path.exists());
        let tables: i64 = db.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='kv_store'",
            [],
            |row| row.get(0),
        )?;
        assert_eq!(tables, 1);
        assert_eq!(db.get_version()?, SCHEMA_VERSION);

        Ok(())
    }

    #[test]
    fn test_reopen_keeps_values() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let db_path = temp_dir.path().join("test.db");

        {
            let db = Database::open(&db_path)?;
            db.set_value("favorites", "[]")?;
        }

        let db = Database::open(&db_path)?;
        assert_eq!(db.get_value("favorites")?.as_deref(), Some("[]"));

        Ok(())
    }

    #[test]
    fn test_set_value_overwrites() -> Result<()> {
        let db = Database::open_in_memory()?;

        assert_eq!(db.get_value("slot")?, None);
        db.set_value("slot", "one")?;
        db.set_value("slot", "two")?;
        assert_eq!(db.get_value("slot")?.as_deref(), Some("two"));

        Ok(())
    }
}

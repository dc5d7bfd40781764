//! SQLite-backed host storage
//!
//! A single database holds both durable options and expiring transients. It
//! is stored at `$XDG_DATA_HOME/lyyti/store.db` unless configured otherwise.
//!
//! # Database Schema
//!
//! - `options`: option name → value
//! - `transients`: cache key → value, with an optional unix expiry time
//! - `schema_version`: Migration tracking

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use lyyti_host::{HostError, HostResult, OptionStore, TransientCache};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{debug, info};

fn storage_error(err: rusqlite::Error) -> HostError {
    HostError::Storage(err.to_string())
}

/// Unix expiry time for an entry written at `now` with `ttl`.
fn expiry(now: i64, ttl: Option<Duration>) -> Option<i64> {
    ttl.map(|ttl| now.saturating_add(i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX)))
}

/// SQLite implementation of the option store and the transient cache.
///
/// The connection is wrapped in a `Mutex` to allow interior mutability
/// and to satisfy the `Sync` trait requirement.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open the store database at a specific path, creating it if needed.
    pub fn open_at(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create store directory: {:?}", parent))?;
        }

        debug!("Opening store database at: {:?}", path);
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database at {:?}", path))?;

        Self::from_connection(conn)
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run database migrations to set up the schema.
    fn run_migrations(&self) -> Result<()> {
        let mut conn = self.conn();

        conn.execute(
            "CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY
            )",
            [],
        )
        .context("Failed to create schema_version table")?;

        let current_version: i32 = conn
            .query_row(
                "SELECT COALESCE(MAX(version), 0) FROM schema_version",
                [],
                |row| row.get(0),
            )
            .context("Failed to read schema version")?;

        debug!("Current schema version: {}", current_version);

        if current_version < 1 {
            Self::migrate_to_v1(&mut conn)?;
        }

        Ok(())
    }

    /// Migration to version 1: Initial schema.
    fn migrate_to_v1(conn: &mut Connection) -> Result<()> {
        info!("Running migration to schema version 1");

        let tx = conn.transaction()?;

        tx.execute(
            "CREATE TABLE IF NOT EXISTS options (
                name TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
            [],
        )
        .context("Failed to create options table")?;

        tx.execute(
            "CREATE TABLE IF NOT EXISTS transients (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                expires_at INTEGER
            )",
            [],
        )
        .context("Failed to create transients table")?;

        tx.execute(
            "CREATE INDEX IF NOT EXISTS idx_transients_expires_at
             ON transients(expires_at)",
            [],
        )?;

        tx.execute("INSERT INTO schema_version (version) VALUES (1)", [])?;
        tx.commit()?;

        Ok(())
    }

    fn transient_get_at(&self, key: &str, now: i64) -> HostResult<Option<String>> {
        let conn = self.conn();
        let row: Option<(String, Option<i64>)> = conn
            .query_row(
                "SELECT value, expires_at FROM transients WHERE key = ?1",
                params![key],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .map_err(storage_error)?;

        match row {
            Some((_, Some(expires_at))) if expires_at <= now => {
                conn.execute("DELETE FROM transients WHERE key = ?1", params![key])
                    .map_err(storage_error)?;
                debug!(key, "Transient expired");
                Ok(None)
            }
            Some((value, _)) => Ok(Some(value)),
            None => Ok(None),
        }
    }

    fn transient_set_at(
        &self,
        key: &str,
        value: &str,
        ttl: Option<Duration>,
        now: i64,
    ) -> HostResult<()> {
        self.conn()
            .execute(
                "INSERT INTO transients (key, value, expires_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value, expires_at = excluded.expires_at",
                params![key, value, expiry(now, ttl)],
            )
            .map_err(storage_error)?;
        Ok(())
    }

    /// Delete every expired transient. Returns how many were removed.
    pub fn purge_expired(&self) -> HostResult<usize> {
        self.purge_expired_at(Utc::now().timestamp())
    }

    fn purge_expired_at(&self, now: i64) -> HostResult<usize> {
        let removed = self
            .conn()
            .execute(
                "DELETE FROM transients WHERE expires_at IS NOT NULL AND expires_at <= ?1",
                params![now],
            )
            .map_err(storage_error)?;
        if removed > 0 {
            debug!(removed, "Purged expired transients");
        }
        Ok(removed)
    }
}

impl OptionStore for SqliteStore {
    fn get(&self, name: &str) -> HostResult<Option<String>> {
        self.conn()
            .query_row(
                "SELECT value FROM options WHERE name = ?1",
                params![name],
                |row| row.get(0),
            )
            .optional()
            .map_err(storage_error)
    }

    fn add(&self, name: &str, value: &str) -> HostResult<bool> {
        let inserted = self
            .conn()
            .execute(
                "INSERT OR IGNORE INTO options (name, value) VALUES (?1, ?2)",
                params![name, value],
            )
            .map_err(storage_error)?;
        Ok(inserted == 1)
    }

    fn update(&self, name: &str, value: &str) -> HostResult<()> {
        self.conn()
            .execute(
                "INSERT INTO options (name, value) VALUES (?1, ?2)
                 ON CONFLICT(name) DO UPDATE SET value = excluded.value",
                params![name, value],
            )
            .map_err(storage_error)?;
        Ok(())
    }

    fn delete(&self, name: &str) -> HostResult<bool> {
        let deleted = self
            .conn()
            .execute("DELETE FROM options WHERE name = ?1", params![name])
            .map_err(storage_error)?;
        Ok(deleted > 0)
    }
}

#[async_trait]
impl TransientCache for SqliteStore {
    async fn get(&self, key: &str) -> HostResult<Option<String>> {
        self.transient_get_at(key, Utc::now().timestamp())
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> HostResult<()> {
        self.transient_set_at(key, value, ttl, Utc::now().timestamp())
    }
}

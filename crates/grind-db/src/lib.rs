//! Storage layer for the study split timer.
//!
//! Provides the [`Persistence`] collaborator (asynchronous get/set of string
//! blobs under fixed keys), a SQLite implementation of it, and the
//! [`DailyAggregateStore`] that keeps the per-day history and writes it back.
//!
//! # Thread Safety
//!
//! [`SqlitePersistence`] wraps a `rusqlite::Connection` behind a mutex and runs
//! every statement on the blocking pool, so it is `Send + Sync` and can be
//! shared as `Arc<dyn Persistence>`. Statements are serialized by the mutex.
//!
//! # Schema
//!
//! A single `kv` table holds one row per key. `updated_at` is stored as TEXT in
//! ISO 8601 format (e.g. `2026-10-16T10:30:00.000Z`), always UTC.

mod store;

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use thiserror::Error;

pub use store::{DailyAggregateStore, HISTORY_KEY, load_history};

/// Persistence errors.
#[derive(Debug, Error)]
pub enum PersistError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// A previous statement panicked while holding the connection.
    #[error("database connection poisoned")]
    Poisoned,
    /// The blocking task running a statement failed.
    #[error("storage task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
    /// Failed to parse a stored timestamp.
    #[error("invalid timestamp for {key}: {timestamp}")]
    TimestampParse {
        key: String,
        timestamp: String,
        #[source]
        source: chrono::ParseError,
    },
    /// Error reported by another persistence backend.
    #[error("persistence backend error: {0}")]
    Backend(String),
}

/// Asynchronous key/value storage for serialized blobs.
#[async_trait]
pub trait Persistence: Send + Sync {
    /// Returns the blob stored under `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<String>, PersistError>;

    /// Replaces the blob stored under `key`.
    async fn set(&self, key: &str, value: &str) -> Result<(), PersistError>;
}

/// SQLite-backed [`Persistence`].
///
/// See the [module documentation](self) for thread safety considerations.
#[derive(Clone)]
pub struct SqlitePersistence {
    conn: Arc<Mutex<Connection>>,
}

impl std::fmt::Debug for SqlitePersistence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqlitePersistence").finish_non_exhaustive()
    }
}

impl SqlitePersistence {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The schema is automatically initialized on first open.
    pub fn open(path: &Path) -> Result<Self, PersistError> {
        let conn = Connection::open(path)?;
        init(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the last clone drops.
    pub fn open_in_memory() -> Result<Self, PersistError> {
        let conn = Connection::open_in_memory()?;
        init(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// When `key` was last written.
    pub async fn updated_at(&self, key: &str) -> Result<Option<DateTime<Utc>>, PersistError> {
        let key = key.to_string();
        self.with_conn(move |conn| {
            let stored: Option<String> = conn
                .query_row(
                    "SELECT updated_at FROM kv WHERE key = ?1",
                    params![key],
                    |row| row.get(0),
                )
                .optional()?;
            stored
                .map(|timestamp| parse_timestamp(&timestamp, &key))
                .transpose()
        })
        .await
    }

    /// Runs `f` against the connection on the blocking pool.
    async fn with_conn<T, F>(&self, f: F) -> Result<T, PersistError>
    where
        F: FnOnce(&Connection) -> Result<T, PersistError> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn.lock().map_err(|_| PersistError::Poisoned)?;
            f(&guard)
        })
        .await?
    }
}

#[async_trait]
impl Persistence for SqlitePersistence {
    async fn get(&self, key: &str) -> Result<Option<String>, PersistError> {
        let key = key.to_string();
        self.with_conn(move |conn| {
            let value = conn
                .query_row(
                    "SELECT value FROM kv WHERE key = ?1",
                    params![key],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(value)
        })
        .await
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), PersistError> {
        let key = key.to_string();
        let value = value.to_string();
        let updated_at = format_timestamp(Utc::now());
        self.with_conn(move |conn| {
            conn.execute(
                "
                INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
                ON CONFLICT(key) DO UPDATE SET
                    value = excluded.value,
                    updated_at = excluded.updated_at
                ",
                params![key, value, updated_at],
            )?;
            Ok(())
        })
        .await
    }
}

/// Initializes the schema.
///
/// This is idempotent - safe to call on an already-initialized database.
fn init(conn: &Connection) -> Result<(), PersistError> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS kv (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        ",
    )?;
    Ok(())
}

fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_timestamp(timestamp: &str, key: &str) -> Result<DateTime<Utc>, PersistError> {
    DateTime::parse_from_rfc3339(timestamp)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|source| PersistError::TimestampParse {
            key: key.to_string(),
            timestamp: timestamp.to_string(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn get_missing_key_returns_none() {
        let db = SqlitePersistence::open_in_memory().unwrap();
        assert_eq!(db.get("absent").await.unwrap(), None);
        assert_eq!(db.updated_at("absent").await.unwrap(), None);
    }

    #[tokio::test]
    async fn set_overwrites_previous_value() {
        let db = SqlitePersistence::open_in_memory().unwrap();
        db.set("k", "first").await.unwrap();
        db.set("k", "second").await.unwrap();

        assert_eq!(db.get("k").await.unwrap().as_deref(), Some("second"));
        assert!(db.updated_at("k").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn values_survive_reopen() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("grind.db");

        SqlitePersistence::open(&path)
            .unwrap()
            .set("k", "kept")
            .await
            .unwrap();

        let reopened = SqlitePersistence::open(&path).unwrap();
        assert_eq!(reopened.get("k").await.unwrap().as_deref(), Some("kept"));
    }

    #[test]
    fn timestamps_round_trip() {
        let now = Utc::now();
        let parsed = parse_timestamp(&format_timestamp(now), "k").unwrap();
        assert_eq!(parsed.timestamp_millis(), now.timestamp_millis());
        assert!(parse_timestamp("yesterday", "k").is_err());
    }
}

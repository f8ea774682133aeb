//! SQLite-backed key-value store (feature `sqlite`).
//!
//! One table `kv(key TEXT PRIMARY KEY, value TEXT, expires_at INTEGER NULL)`;
//! `expires_at` is unix milliseconds. Expired rows read as missing and are
//! deleted on read; `purge_expired` sweeps the table.

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};

use crate::memory::store::{Store, StoreError};

/// Persistent store for checkpoints and fragments.
///
/// **Interaction**: Used as `Arc<dyn Store>`; each call runs on the blocking pool
/// against a single shared connection.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

fn storage_err(e: impl std::fmt::Display) -> StoreError {
    StoreError::Storage(e.to_string())
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

impl SqliteStore {
    /// Opens (or creates) the database file and ensures the table exists.
    pub fn new(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(storage_err)?;
        Self::init(conn)
    }

    /// In-memory SQLite database; contents are lost when dropped.
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(storage_err)?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                expires_at INTEGER
            );
            CREATE INDEX IF NOT EXISTS kv_expires_at ON kv(expires_at);",
        )
        .map_err(storage_err)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    async fn with_conn<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, rusqlite::Error> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn
                .lock()
                .map_err(|_| StoreError::Storage("sqlite connection lock poisoned".into()))?;
            f(&*guard).map_err(storage_err)
        })
        .await
        .map_err(storage_err)?
    }

    /// Deletes all expired rows; returns how many were removed.
    pub async fn purge_expired(&self) -> Result<usize, StoreError> {
        let now = now_millis();
        self.with_conn(move |c| {
            c.execute(
                "DELETE FROM kv WHERE expires_at IS NOT NULL AND expires_at <= ?1",
                params![now],
            )
        })
        .await
    }
}

#[async_trait]
impl Store for SqliteStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let key = key.to_string();
        let now = now_millis();
        self.with_conn(move |c| {
            let row: Option<(String, Option<i64>)> = c
                .query_row(
                    "SELECT value, expires_at FROM kv WHERE key = ?1",
                    params![key],
                    |r| Ok((r.get(0)?, r.get(1)?)),
                )
                .optional()?;
            match row {
                Some((_, Some(expires_at))) if expires_at <= now => {
                    c.execute("DELETE FROM kv WHERE key = ?1", params![key])?;
                    Ok(None)
                }
                Some((value, _)) => Ok(Some(value)),
                None => Ok(None),
            }
        })
        .await
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), StoreError> {
        let key = key.to_string();
        let value = value.to_string();
        let expires_at = ttl.map(|d| now_millis() + d.as_millis() as i64);
        self.with_conn(move |c| {
            c.execute(
                "INSERT INTO kv (key, value, expires_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value, expires_at = excluded.expires_at",
                params![key, value, expires_at],
            )
            .map(|_| ())
        })
        .await
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let key = key.to_string();
        self.with_conn(move |c| c.execute("DELETE FROM kv WHERE key = ?1", params![key]).map(|_| ()))
            .await
    }
}

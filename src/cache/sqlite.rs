//! SQLite-backed persisted cache.

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, OptionalExtension};
use std::path::Path;

use super::KeyValueCache;
use crate::db::{migrate, Db};
use crate::error::{CrawlError, Result};

/// Persisted cache stored in a single SQLite file.
#[derive(Debug, Clone)]
pub struct SqliteCache {
    db: Db,
}

impl SqliteCache {
    /// Open (creating if needed) the cache file and bring its schema up to date.
    pub async fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let db = Db::new(path);
        db.with_connection(migrate::run_migrations).await?;
        log::info!("Cache opened at {}", db.path().display());
        Ok(Self { db })
    }

    /// Number of stored entries.
    pub async fn len(&self) -> Result<usize> {
        self.db
            .with_connection(|conn| {
                let count: i64 = conn.query_row("SELECT COUNT(*) FROM cache_entries", [], |row| row.get(0))?;
                Ok(count as usize)
            })
            .await
    }
}

#[async_trait]
impl KeyValueCache for SqliteCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let key = key.to_string();
        self.db
            .with_connection(move |conn| {
                conn.query_row(
                    "SELECT value FROM cache_entries WHERE key = ?1",
                    params![key],
                    |row| row.get::<_, String>(0),
                )
                .optional()
                .map_err(CrawlError::Database)
            })
            .await
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let key = key.to_string();
        let value = value.to_string();
        let updated_at = Utc::now().to_rfc3339();
        self.db
            .with_connection(move |conn| {
                conn.execute(
                    "INSERT INTO cache_entries (key, value, updated_at) VALUES (?1, ?2, ?3)
                     ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
                    params![key, value, updated_at],
                )?;
                Ok(())
            })
            .await
    }
}

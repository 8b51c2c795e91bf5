//! Persisted cache of friend lists and node snapshots.
//!
//! Values are JSON text under string keys: `user_<id>` for node snapshots,
//! `friends_<id>` for fetched friend lists and [`USER_IDS_KEY`] for the ids
//! of every node known at the end of the last run.

pub mod bridge;
pub mod memory;
pub mod sqlite;

pub use bridge::CacheBridge;
pub use memory::MemoryCache;
pub use sqlite::SqliteCache;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{CrawlError, Result};
use crate::graph::NodeId;

/// Key holding the list of all known node ids.
pub const USER_IDS_KEY: &str = "userids";

/// Key of a node snapshot.
pub fn user_key(id: NodeId) -> String {
    format!("user_{}", id)
}

/// Key of a cached friend list.
pub fn friends_key(id: NodeId) -> String {
    format!("friends_{}", id)
}

/// String key-value store. A missing key is `Ok(None)`, never an error.
#[async_trait]
pub trait KeyValueCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// Read and decode a JSON value. A value that does not decode is reported
/// as [`CrawlError::Cache`].
pub async fn get_json<T: DeserializeOwned>(cache: &dyn KeyValueCache, key: &str) -> Result<Option<T>> {
    match cache.get(key).await? {
        Some(raw) => serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| CrawlError::Cache(format!("Corrupt cache entry {}: {}", key, e))),
        None => Ok(None),
    }
}

/// Encode a value as JSON and store it.
pub async fn set_json<T: Serialize + ?Sized + Sync>(cache: &dyn KeyValueCache, key: &str, value: &T) -> Result<()> {
    let raw = serde_json::to_string(value)
        .map_err(|e| CrawlError::Cache(format!("Failed to encode cache entry {}: {}", key, e)))?;
    cache.set(key, &raw).await
}

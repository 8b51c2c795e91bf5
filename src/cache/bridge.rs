//! Reconciles the persisted cache with the live node store.

use std::sync::Arc;

use super::{get_json, set_json, user_key, KeyValueCache, USER_IDS_KEY};
use crate::error::Result;
use crate::graph::{NodeId, NodeSnapshot, NodeStore};

/// Loads node snapshots before a crawl and writes back changed nodes after.
#[derive(Clone)]
pub struct CacheBridge {
    cache: Arc<dyn KeyValueCache>,
}

impl CacheBridge {
    pub fn new(cache: Arc<dyn KeyValueCache>) -> Self {
        Self { cache }
    }

    /// Install every cached node snapshot into `store` as a fresh baseline.
    ///
    /// Never fails: an unreadable id list or snapshot is logged and skipped,
    /// so the crawl proceeds with live data. Returns the number installed.
    pub async fn hydrate(&self, store: &mut NodeStore) -> usize {
        let ids = match get_json::<Vec<NodeId>>(self.cache.as_ref(), USER_IDS_KEY).await {
            Ok(Some(ids)) => ids,
            Ok(None) => {
                log::info!("No cached user list, starting cold");
                return 0;
            }
            Err(e) => {
                log::warn!("Ignoring unreadable cached user list: {}", e);
                return 0;
            }
        };

        let mut installed = 0;
        for id in ids {
            match get_json::<NodeSnapshot>(self.cache.as_ref(), &user_key(id)).await {
                Ok(Some(snapshot)) => {
                    store.install_cached(id, snapshot);
                    installed += 1;
                    log::info!("Fetched user {} from cache", id);
                }
                Ok(None) => {}
                Err(e) => {
                    log::warn!("Skipping cached user {}: {}", id, e);
                }
            }
        }
        installed
    }

    /// Write the full id list, then every node changed since it was loaded.
    ///
    /// Returns the number of node snapshots written. The first failed write
    /// aborts the drain and is returned.
    pub async fn persist(&self, store: &NodeStore) -> Result<usize> {
        set_json(self.cache.as_ref(), USER_IDS_KEY, &store.ids()).await?;

        let mut written = 0;
        for (id, node) in store.iter() {
            if node.is_cache_fresh() {
                continue;
            }
            set_json(self.cache.as_ref(), &user_key(id), &node.snapshot()).await?;
            written += 1;
            log::info!("Stored user {} in cache", id);
        }
        Ok(written)
    }
}

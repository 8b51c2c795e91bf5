use async_trait::async_trait;
use std::sync::Arc;

use super::{FriendEntry, FriendSource};
use crate::cache::{friends_key, get_json, set_json, KeyValueCache};
use crate::error::Result;
use crate::graph::NodeId;

/// Counters for a cache-first friend source.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FetchStats {
    pub cache_hits: usize,
    pub live_fetches: usize,
}

/// Cache-first friend source.
///
/// Looks up `friends_<id>` in the persisted cache before asking the inner
/// source, and stores live results back. Cache failures are never fatal: a
/// failed read is a miss, a failed write only loses the cached copy.
pub struct CachedFriendSource<S> {
    inner: S,
    cache: Arc<dyn KeyValueCache>,
    stats: FetchStats,
}

impl<S: FriendSource> CachedFriendSource<S> {
    pub fn new(inner: S, cache: Arc<dyn KeyValueCache>) -> Self {
        Self {
            inner,
            cache,
            stats: FetchStats::default(),
        }
    }

    pub fn stats(&self) -> FetchStats {
        self.stats
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

#[async_trait]
impl<S: FriendSource> FriendSource for CachedFriendSource<S> {
    async fn fetch_friends(&mut self, id: NodeId) -> Result<Vec<FriendEntry>> {
        let key = friends_key(id);

        match get_json::<Vec<FriendEntry>>(self.cache.as_ref(), &key).await {
            Ok(Some(friends)) => {
                log::debug!("Cache hit for friends of {}", id);
                self.stats.cache_hits += 1;
                return Ok(friends);
            }
            Ok(None) => {}
            Err(e) => {
                log::warn!("Ignoring unreadable cache entry {}: {}", key, e);
            }
        }

        let friends = self.inner.fetch_friends(id).await?;
        self.stats.live_fetches += 1;

        log::info!("Storing userid {}", id);
        if let Err(e) = set_json(self.cache.as_ref(), &key, &friends).await {
            log::warn!("Failed to cache friends of {}: {}", id, e);
        }

        Ok(friends)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use crate::error::CrawlError;
    use crate::fetch::FixtureFriendSource;
    use std::collections::HashMap;

    struct BrokenCache;

    #[async_trait]
    impl KeyValueCache for BrokenCache {
        async fn get(&self, _key: &str) -> Result<Option<String>> {
            Err(CrawlError::Cache("unreachable".to_string()))
        }

        async fn set(&self, _key: &str, _value: &str) -> Result<()> {
            Err(CrawlError::Cache("unreachable".to_string()))
        }
    }

    fn fixture() -> FixtureFriendSource {
        let mut lists = HashMap::new();
        lists.insert(NodeId(1), vec![FriendEntry::new(NodeId(2), "Bo")]);
        FixtureFriendSource::new(lists)
    }

    #[tokio::test]
    async fn test_live_result_is_cached_then_reused() {
        let cache = Arc::new(MemoryCache::new());
        let mut source = CachedFriendSource::new(fixture(), cache.clone());

        let first = source.fetch_friends(NodeId(1)).await.unwrap();
        let second = source.fetch_friends(NodeId(1)).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(source.inner().requests(), &[NodeId(1)]);
        assert_eq!(source.stats(), FetchStats { cache_hits: 1, live_fetches: 1 });
        assert!(cache.get("friends_1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_corrupt_entry_falls_back_to_live() {
        let cache = Arc::new(MemoryCache::new());
        cache.set("friends_1", "not json").await.unwrap();
        let mut source = CachedFriendSource::new(fixture(), cache.clone());

        let friends = source.fetch_friends(NodeId(1)).await.unwrap();
        assert_eq!(friends.len(), 1);
        assert_eq!(source.stats().live_fetches, 1);
    }

    #[tokio::test]
    async fn test_unreachable_cache_degrades_to_live() {
        let mut source = CachedFriendSource::new(fixture(), Arc::new(BrokenCache));
        let friends = source.fetch_friends(NodeId(1)).await.unwrap();
        assert_eq!(friends[0].uid, NodeId(2));
        assert_eq!(source.stats(), FetchStats { cache_hits: 0, live_fetches: 1 });
    }
}

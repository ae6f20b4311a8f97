//! Bounded read cache of stored records.
//!
//! Entries hold the raw item and the tick it was cached at. Reads promote an entry,
//! so the least-recently-read entry is evicted first once the capacity is reached.
//! Entries older than the freshness window are dropped when touched.

use crate::{clock, common};

use lru::LruCache;
use std::{fmt, num, sync, time};
use tokio::sync::Mutex;

#[derive(Clone, Debug)]
struct CacheEntry {
    cached_at: i64,
    item: common::Item,
}

/// LRU cache of stored records keyed by `{table}:{PK}{SK}`.
///
/// A capacity of zero disables the cache: inserts are ignored and every lookup misses.
pub struct EnvelopeCache {
    capacity: usize,
    clock: sync::Arc<dyn clock::Clock>,
    entries: Option<Mutex<LruCache<String, CacheEntry>>>,
    freshness: i64,
}

impl fmt::Debug for EnvelopeCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvelopeCache")
            .field("capacity", &self.capacity)
            .field("clock", &self.clock)
            .field("freshness", &self.freshness)
            .finish_non_exhaustive()
    }
}

impl EnvelopeCache {
    /// Cache holding at most `capacity` records for `freshness` each.
    pub fn new(
        capacity: usize,
        freshness: time::Duration,
        clock: sync::Arc<dyn clock::Clock>,
    ) -> Self {
        Self {
            capacity,
            clock,
            entries: num::NonZeroUsize::new(capacity)
                .map(|capacity| Mutex::new(LruCache::new(capacity))),
            freshness: clock::duration_to_ticks(freshness),
        }
    }

    /// Maximum number of records held.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Whether the cache can hold anything.
    pub fn is_enabled(&self) -> bool {
        self.entries.is_some()
    }

    /// Fresh record under `key`, promoting it. A stale entry is dropped.
    pub async fn get(&self, key: &str) -> Option<common::Item> {
        let entries = self.entries.as_ref()?;
        let now = self.clock.now_ticks();
        let mut entries = entries.lock().await;
        let entry = entries.get(key)?;
        if now.saturating_sub(entry.cached_at) < self.freshness {
            return Some(entry.item.clone());
        }
        entries.pop(key);
        #[cfg(feature = "tracing")]
        tracing::debug!(key, "dropped stale cache entry");
        None
    }

    /// Cache a record, replacing any entry under the same key.
    pub async fn insert(&self, key: String, item: common::Item) {
        let Some(entries) = &self.entries else {
            return;
        };
        let entry = CacheEntry {
            cached_at: self.clock.now_ticks(),
            item,
        };
        let mut entries = entries.lock().await;
        let replaced = entries.push(key.clone(), entry);
        if let Some((evicted, _)) = replaced
            && evicted != key
        {
            #[cfg(feature = "tracing")]
            tracing::debug!(key = %evicted, "evicted least recently read cache entry");
        }
    }

    /// Drop the entry under `key`.
    pub async fn remove(&self, key: &str) {
        if let Some(entries) = &self.entries {
            entries.lock().await.pop(key);
        }
    }

    /// Whether an entry, fresh or not, is held under `key`. Does not promote it.
    pub async fn contains(&self, key: &str) -> bool {
        match &self.entries {
            Some(entries) => entries.lock().await.contains(key),
            None => false,
        }
    }

    /// Number of entries held.
    pub async fn len(&self) -> usize {
        match &self.entries {
            Some(entries) => entries.lock().await.len(),
            None => 0,
        }
    }

    /// Whether no entry is held.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Drop every entry.
    pub async fn clear(&self) {
        if let Some(entries) = &self.entries {
            entries.lock().await.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use aws_sdk_dynamodb::types;

    fn item(value: &str) -> common::Item {
        common::Item::from([(
            "Data".to_string(),
            types::AttributeValue::S(value.to_string()),
        )])
    }

    fn cache(capacity: usize, clock: &clock::ManualClock) -> EnvelopeCache {
        EnvelopeCache::new(
            capacity,
            time::Duration::from_secs(60),
            sync::Arc::new(clock.clone()),
        )
    }

    #[tokio::test]
    async fn test_eviction_keeps_capacity_and_drops_least_recently_read() {
        let clock = clock::ManualClock::new(0);
        let cache = cache(3, &clock);
        for key in ["a", "b", "c"] {
            cache.insert(key.to_string(), item(key)).await;
        }
        // reading "a" makes "b" the least recently read
        assert_eq!(cache.get("a").await, Some(item("a")));
        cache.insert("d".to_string(), item("d")).await;
        cache.insert("e".to_string(), item("e")).await;

        assert_eq!(cache.len().await, 3);
        assert!(!cache.contains("b").await);
        assert!(!cache.contains("c").await);
        for key in ["a", "d", "e"] {
            assert!(cache.contains(key).await, "{key} should be cached");
        }
    }

    #[tokio::test]
    async fn test_many_inserts_never_exceed_capacity() {
        let clock = clock::ManualClock::new(0);
        let cache = cache(8, &clock);
        for index in 0..100 {
            cache.insert(format!("t:k{index}"), item("v")).await;
            assert!(cache.len().await <= 8);
        }
        assert!(cache.contains("t:k99").await);
        assert!(!cache.contains("t:k91").await);
    }

    #[tokio::test]
    async fn test_entries_expire_after_freshness_window() {
        let clock = clock::ManualClock::new(0);
        let cache = cache(2, &clock);
        cache.insert("a".to_string(), item("a")).await;

        clock.advance(time::Duration::from_secs(59));
        assert_eq!(cache.get("a").await, Some(item("a")));

        clock.advance(time::Duration::from_secs(1));
        assert_eq!(cache.get("a").await, None);
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_insert_replaces_and_restamps_entry() {
        let clock = clock::ManualClock::new(0);
        let cache = cache(2, &clock);
        cache.insert("a".to_string(), item("old")).await;
        clock.advance(time::Duration::from_secs(40));
        cache.insert("a".to_string(), item("new")).await;
        clock.advance(time::Duration::from_secs(40));

        assert_eq!(cache.get("a").await, Some(item("new")));
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_zero_capacity_disables_cache() {
        let clock = clock::ManualClock::new(0);
        let cache = cache(0, &clock);
        cache.insert("a".to_string(), item("a")).await;

        assert!(!cache.is_enabled());
        assert_eq!(cache.get("a").await, None);
        assert_eq!(cache.len().await, 0);
    }

    #[tokio::test]
    async fn test_remove_and_clear() {
        let clock = clock::ManualClock::new(0);
        let cache = cache(4, &clock);
        for key in ["a", "b", "c"] {
            cache.insert(key.to_string(), item(key)).await;
        }
        cache.remove("b").await;
        cache.remove("missing").await;
        assert_eq!(cache.len().await, 2);
        cache.clear().await;
        assert!(cache.is_empty().await);
    }
}

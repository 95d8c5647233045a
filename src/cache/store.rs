//! In-process document cache with per-entry expiry.
//!
//! Entries are whole rendered documents keyed by [`CacheKey`]. A miss runs the
//! caller's builder outside of any lock; concurrent misses may build the same
//! document twice and the last writer wins. A build that overlaps an
//! invalidation is returned to its caller but not stored.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use metrics::counter;
use time::{Duration, OffsetDateTime};
use tracing::debug;

use super::clock::Clock;
use super::keys::CacheKey;
use super::lock::{rw_read, rw_write};

const SOURCE: &str = "cache::store";

const METRIC_CACHE_HIT: &str = "llms_txt_cache_hit_total";
const METRIC_CACHE_MISS: &str = "llms_txt_cache_miss_total";
const METRIC_CACHE_INVALIDATE: &str = "llms_txt_cache_invalidate_total";

#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub value: String,
    pub expires_at: OffsetDateTime,
}

impl CacheEntry {
    fn is_live(&self, now: OffsetDateTime) -> bool {
        now < self.expires_at
    }
}

pub struct DocumentCache {
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
    /// Bumped under the entries write lock by every invalidation.
    generation: AtomicU64,
    clock: Arc<dyn Clock>,
}

impl DocumentCache {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            generation: AtomicU64::new(0),
            clock,
        }
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Return the cached document for `key`, or build, store and return it.
    ///
    /// Builder errors are returned unchanged and leave the cache untouched. The
    /// built value is not stored when an invalidation lands while it is built.
    pub async fn fetch<F, Fut, E>(&self, key: CacheKey, ttl: Duration, build: F) -> Result<String, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String, E>>,
    {
        if let Some(value) = self.get(key) {
            counter!(METRIC_CACHE_HIT, "key" => key.as_str()).increment(1);
            return Ok(value);
        }

        counter!(METRIC_CACHE_MISS, "key" => key.as_str()).increment(1);
        let generation = self.generation.load(Ordering::Acquire);
        let value = build().await?;
        self.put_unless_invalidated(key, value.clone(), ttl, generation);
        Ok(value)
    }

    /// Live entry for `key`, if any.
    pub fn get(&self, key: CacheKey) -> Option<String> {
        let now = self.clock.now();
        rw_read(&self.entries, SOURCE, "get")
            .get(&key)
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.value.clone())
    }

    pub fn put(&self, key: CacheKey, value: String, ttl: Duration) {
        let expires_at = self.clock.now() + ttl;
        debug!(cache_key = key.as_str(), %expires_at, "Caching document");
        rw_write(&self.entries, SOURCE, "put").insert(key, CacheEntry { value, expires_at });
    }

    fn put_unless_invalidated(
        &self,
        key: CacheKey,
        value: String,
        ttl: Duration,
        generation: u64,
    ) {
        let expires_at = self.clock.now() + ttl;
        let mut entries = rw_write(&self.entries, SOURCE, "put_unless_invalidated");
        if self.generation.load(Ordering::Acquire) != generation {
            debug!(
                cache_key = key.as_str(),
                "Discarding document built across an invalidation"
            );
            return;
        }
        debug!(cache_key = key.as_str(), %expires_at, "Caching document");
        entries.insert(key, CacheEntry { value, expires_at });
    }

    pub fn invalidate(&self, key: CacheKey) {
        let removed = {
            let mut entries = rw_write(&self.entries, SOURCE, "invalidate");
            self.generation.fetch_add(1, Ordering::AcqRel);
            entries.remove(&key).is_some()
        };
        if removed {
            counter!(METRIC_CACHE_INVALIDATE, "key" => key.as_str()).increment(1);
        }
    }

    /// Remove every key in `keys` under a single write lock.
    pub fn invalidate_all(&self, keys: &[CacheKey]) {
        let removed: Vec<CacheKey> = {
            let mut entries = rw_write(&self.entries, SOURCE, "invalidate_all");
            self.generation.fetch_add(1, Ordering::AcqRel);
            keys.iter()
                .filter(|key| entries.remove(*key).is_some())
                .copied()
                .collect()
        };

        for key in removed {
            counter!(METRIC_CACHE_INVALIDATE, "key" => key.as_str()).increment(1);
        }
    }

    /// Keys with a live entry, in stable order.
    pub fn cached_keys(&self) -> Vec<CacheKey> {
        let now = self.clock.now();
        let mut keys: Vec<CacheKey> = rw_read(&self.entries, SOURCE, "cached_keys")
            .iter()
            .filter(|(_, entry)| entry.is_live(now))
            .map(|(key, _)| *key)
            .collect();
        keys.sort();
        keys
    }
}

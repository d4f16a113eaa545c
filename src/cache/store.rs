//! Time-bounded in-memory store backing the category fast path.

use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use lru::LruCache;
use metrics::counter;
use serde::Serialize;

use crate::domain::entities::PostRecord;

use super::clock::{Clock, SystemClock};
use super::config::FastCacheConfig;
use super::keys::FastCacheKey;
use super::lock::{rw_read, rw_write};

const SOURCE: &str = "cache::store";

pub(crate) const METRIC_FAST_CACHE_HIT: &str = "bloglane_fast_cache_hit_total";
pub(crate) const METRIC_FAST_CACHE_MISS: &str = "bloglane_fast_cache_miss_total";
pub(crate) const METRIC_FAST_CACHE_EXPIRED: &str = "bloglane_fast_cache_expired_total";

/// Posts of one category plus pagination flags.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySlice {
    pub posts: Arc<[PostRecord]>,
    pub total_posts: usize,
    pub has_more: bool,
    pub next_page: Option<u32>,
}

impl CategorySlice {
    /// A complete, single-page slice.
    pub fn complete(posts: Vec<PostRecord>) -> Self {
        let total_posts = posts.len();
        Self {
            posts: posts.into(),
            total_posts,
            has_more: false,
            next_page: None,
        }
    }

    pub fn empty() -> Self {
        Self::complete(Vec::new())
    }
}

struct CacheEntry {
    value: CategorySlice,
    stored_at: Instant,
}

/// Process-wide fast-path cache.
///
/// Entries are fresh while strictly less than `ttl` has elapsed since they
/// were stored; anything older is dropped on read and reported as expired.
/// At most `capacity` entries are kept, the least recently used going first.
pub struct FastCache {
    entries: RwLock<LruCache<String, CacheEntry>>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl FastCache {
    pub fn new(config: &FastCacheConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: &FastCacheConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(LruCache::new(config.capacity_non_zero())),
            clock,
            ttl: config.ttl,
        }
    }

    pub fn get(&self, key: &FastCacheKey) -> Option<CategorySlice> {
        let cache_key = key.to_string();
        let now = self.clock.now();

        let mut entries = rw_write(&self.entries, SOURCE, "get");
        let fresh = match entries.get(&cache_key) {
            None => {
                counter!(METRIC_FAST_CACHE_MISS, "kind" => key.kind()).increment(1);
                return None;
            }
            Some(entry) if self.is_fresh(entry, now) => Some(entry.value.clone()),
            Some(_) => None,
        };

        match fresh {
            Some(value) => {
                counter!(METRIC_FAST_CACHE_HIT, "kind" => key.kind()).increment(1);
                Some(value)
            }
            None => {
                entries.pop(&cache_key);
                counter!(METRIC_FAST_CACHE_EXPIRED, "kind" => key.kind()).increment(1);
                None
            }
        }
    }

    pub fn insert(&self, key: &FastCacheKey, value: CategorySlice) {
        let entry = CacheEntry {
            value,
            stored_at: self.clock.now(),
        };
        rw_write(&self.entries, SOURCE, "insert").put(key.to_string(), entry);
    }

    pub fn len(&self) -> usize {
        rw_read(&self.entries, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        rw_read(&self.entries, SOURCE, "capacity").cap().get()
    }

    fn is_fresh(&self, entry: &CacheEntry, now: Instant) -> bool {
        now.saturating_duration_since(entry.stored_at) < self.ttl
    }
}

//! Tag-based read cache.
//!
//! Reads are stored under a string key and registered with one [`CacheTag`].
//! Writes invalidate every key registered under a tag (and the tags that
//! depend on it). Entries expire after the revalidation window unless stored
//! with [`CachePolicy::Indefinite`].

use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use metrics::counter;
use moka::Expiry;
use moka::future::Cache;
use tracing::{debug, info};

use crate::domain::{AppError, CacheTag};

/// Default revalidation window for cached reads.
pub const DEFAULT_REVALIDATE: Duration = Duration::from_secs(60);

const MAX_ENTRIES: u64 = 10_000;

/// How long a cached read may be served before it is reloaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    /// Expire after the cache's revalidation window.
    Window,
    /// Keep until the tag is invalidated.
    Indefinite,
}

#[derive(Clone)]
struct CacheEntry {
    value: Arc<dyn Any + Send + Sync>,
    ttl: Option<Duration>,
}

struct EntryExpiry;

impl Expiry<String, CacheEntry> for EntryExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        entry: &CacheEntry,
        _created_at: Instant,
    ) -> Option<Duration> {
        entry.ttl
    }

    fn expire_after_update(
        &self,
        _key: &String,
        entry: &CacheEntry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        entry.ttl
    }
}

#[derive(Default)]
struct TagIndex {
    keys: HashMap<CacheTag, HashSet<String>>,
    generations: HashMap<CacheTag, u64>,
}

/// In-process tag cache shared by all services.
pub struct TagCache {
    inner: Cache<String, CacheEntry>,
    index: Mutex<TagIndex>,
    revalidate: Duration,
}

impl TagCache {
    #[must_use]
    pub fn new(revalidate: Duration) -> Self {
        let inner = Cache::builder()
            .max_capacity(MAX_ENTRIES)
            .expire_after(EntryExpiry)
            .build();
        Self {
            inner,
            index: Mutex::new(TagIndex::default()),
            revalidate,
        }
    }

    /// Returns the cached value for `key`, or runs `load` and caches its result.
    ///
    /// A load that races with an invalidation of `tag` is returned to the caller
    /// but not cached.
    pub async fn get_or_load<T, F, Fut>(
        &self,
        tag: CacheTag,
        key: String,
        policy: CachePolicy,
        load: F,
    ) -> Result<T, AppError>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, AppError>>,
    {
        if let Some(entry) = self.inner.get(&key).await {
            if let Some(value) = entry.value.downcast_ref::<T>() {
                counter!("content_cache_hits_total", "tag" => tag.as_str()).increment(1);
                debug!(%key, "cache hit");
                return Ok(value.clone());
            }
        }

        counter!("content_cache_misses_total", "tag" => tag.as_str()).increment(1);
        debug!(%key, "cache miss");

        let generation = self.generation(tag);
        let value = load().await?;
        if self.generation(tag) != generation {
            return Ok(value);
        }

        self.register(tag, &key);
        let ttl = match policy {
            CachePolicy::Window => Some(self.revalidate),
            CachePolicy::Indefinite => None,
        };
        let entry = CacheEntry {
            value: Arc::new(value.clone()),
            ttl,
        };
        self.inner.insert(key.clone(), entry).await;

        // A revalidation between the check above and the insert must not
        // leave the stale value behind.
        if self.generation(tag) != generation {
            debug!(%key, "evicting read that raced a revalidation");
            self.inner.invalidate(&key).await;
        }

        Ok(value)
    }

    /// Drops every read stored under `tag` and its dependent tags.
    /// Returns the tags that were invalidated.
    pub async fn revalidate_tag(&self, tag: CacheTag) -> Vec<CacheTag> {
        let mut tags = vec![tag];
        tags.extend_from_slice(tag.dependents());

        let keys: Vec<String> = {
            let mut index = self.index.lock().unwrap_or_else(|e| e.into_inner());
            let mut keys = Vec::new();
            for t in &tags {
                *index.generations.entry(*t).or_default() += 1;
                if let Some(registered) = index.keys.remove(t) {
                    keys.extend(registered);
                }
            }
            keys
        };

        for key in &keys {
            self.inner.invalidate(key).await;
        }

        counter!("content_cache_revalidations_total", "tag" => tag.as_str()).increment(1);
        info!(tag = %tag, entries = keys.len(), "revalidated cache tag");
        tags
    }

    /// Invalidates every known tag.
    pub async fn revalidate_all(&self) -> Vec<CacheTag> {
        for tag in CacheTag::ALL {
            self.revalidate_tag(tag).await;
        }
        CacheTag::ALL.to_vec()
    }

    /// Number of keys currently registered under `tag`.
    #[must_use]
    pub fn tracked_keys(&self, tag: CacheTag) -> usize {
        let index = self.index.lock().unwrap_or_else(|e| e.into_inner());
        index.keys.get(&tag).map_or(0, HashSet::len)
    }

    fn generation(&self, tag: CacheTag) -> u64 {
        let index = self.index.lock().unwrap_or_else(|e| e.into_inner());
        index.generations.get(&tag).copied().unwrap_or(0)
    }

    fn register(&self, tag: CacheTag, key: &str) {
        let mut index = self.index.lock().unwrap_or_else(|e| e.into_inner());
        index.keys.entry(tag).or_default().insert(key.to_string());
    }
}

impl Default for TagCache {
    fn default() -> Self {
        Self::new(DEFAULT_REVALIDATE)
    }
}

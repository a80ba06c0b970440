//! Process-lifetime memo store for fetched documents.
//!
//! Keys are the exact request URL strings (no normalization). Values are the
//! document text, or the empty string when the fetch failed: failures occupy a
//! slot like any other entry so a broken URL is not hit again until evicted.
//!
//! Eviction is least-recently-used once `capacity` entries are stored. The
//! store is safe to share between concurrent resolution tasks; racing writers
//! for the same key produce the same value, so last-writer-wins is fine.

use lru::LruCache;
use serde::Serialize;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;

/// Occupancy and effectiveness counters for a [`DocumentCache`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Entries currently stored.
    pub len: usize,
    /// Maximum entries before eviction kicks in.
    pub capacity: usize,
    /// Lookups answered from the store.
    pub hits: u64,
    /// Lookups that had to go to the network.
    pub misses: u64,
}

/// Capacity-bounded LRU map from URL to document text.
#[derive(Debug)]
pub struct DocumentCache {
    entries: Mutex<LruCache<String, Arc<str>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl DocumentCache {
    /// Create a cache holding at most `capacity` documents.
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self { entries: Mutex::new(LruCache::new(capacity)), hits: AtomicU64::new(0), misses: AtomicU64::new(0) }
    }

    /// Look up `url`, marking it most-recently-used on a hit.
    pub async fn get(&self, url: &str) -> Option<Arc<str>> {
        let hit = self.entries.lock().await.get(url).cloned();
        match hit {
            Some(_) => self.hits.fetch_add(1, Ordering::Relaxed),
            None => self.misses.fetch_add(1, Ordering::Relaxed),
        };
        hit
    }

    /// Look up `url` without touching recency or counters.
    pub async fn peek(&self, url: &str) -> Option<Arc<str>> {
        self.entries.lock().await.peek(url).cloned()
    }

    /// Store `text` under `url`, returning the evicted key if the store was full.
    pub async fn insert(&self, url: String, text: Arc<str>) -> Option<String> {
        let mut entries = self.entries.lock().await;
        match entries.push(url, text) {
            // push also returns the old pair when the key was already present
            Some((evicted, _)) if !entries.contains(&evicted) => Some(evicted),
            _ => None,
        }
    }

    /// Whether `url` is currently stored.
    pub async fn contains(&self, url: &str) -> bool {
        self.entries.lock().await.contains(url)
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    /// Snapshot of occupancy and hit/miss counters.
    pub async fn stats(&self) -> CacheStats {
        let entries = self.entries.lock().await;
        CacheStats {
            len: entries.len(),
            capacity: entries.cap().get(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

//! Memoizing fetcher over the shared document cache.

use std::num::NonZeroUsize;
use std::sync::Arc;

use vidrelay_core::{CacheStats, DocumentCache};

use super::PageSource;

/// Fetches documents through a capacity-bounded LRU cache.
///
/// `fetch` never fails: upstream errors become the empty document, and that
/// empty document is cached too, so a broken URL is not retried until its
/// entry is evicted. A fetch abandoned mid-flight (its future dropped) writes
/// nothing to the cache.
pub struct CachedFetcher {
    source: Arc<dyn PageSource>,
    cache: DocumentCache,
}

impl CachedFetcher {
    /// Wrap `source` with a cache of `capacity` documents.
    pub fn new(source: Arc<dyn PageSource>, capacity: NonZeroUsize) -> Self {
        Self { source, cache: DocumentCache::new(capacity) }
    }

    /// Return the document for `url`, hitting the network only on a cache miss.
    pub async fn fetch(&self, url: &str) -> Arc<str> {
        if let Some(hit) = self.cache.get(url).await {
            tracing::debug!("cache hit for {}", url);
            return hit;
        }

        let text: Arc<str> = match self.source.fetch_text(url).await {
            Ok(text) => Arc::from(text),
            Err(e) => {
                tracing::error!(url, code = e.code(), "failed to fetch page: {}", e);
                Arc::from("")
            }
        };

        if let Some(evicted) = self.cache.insert(url.to_string(), Arc::clone(&text)).await {
            tracing::debug!(url, evicted, "fetch cache full, evicted least recently used");
        }

        text
    }

    /// Occupancy and hit/miss counters of the underlying cache.
    pub async fn stats(&self) -> CacheStats {
        self.cache.stats().await
    }

    /// Underlying cache, for inspection.
    pub fn cache(&self) -> &DocumentCache {
        &self.cache
    }
}

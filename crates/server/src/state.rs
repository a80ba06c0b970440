//! Shared application state handed to every route.

use std::num::NonZeroUsize;
use std::sync::Arc;

use url::Url;
use vidrelay_client::{CachedFetcher, FetchClient, FetchConfig, PageSource, Relay, RelayConfig, ResolverPool};
use vidrelay_core::{AppConfig, Error};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub base_url: Arc<Url>,
    pub fetcher: Arc<CachedFetcher>,
    pub pool: Arc<ResolverPool>,
    pub relay: Arc<Relay>,
}

impl AppState {
    /// Wire the production stack: reqwest page client behind the memo cache.
    pub fn build(config: AppConfig) -> Result<Self, Error> {
        let source = FetchClient::new(FetchConfig::from_app(&config))?;
        Self::with_source(config, Arc::new(source))
    }

    /// Wire everything around an arbitrary page source.
    pub fn with_source(config: AppConfig, source: Arc<dyn PageSource>) -> Result<Self, Error> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| Error::InvalidUrl(format!("base_url {}: {}", config.base_url, e)))?;
        let capacity = NonZeroUsize::new(config.cache_size)
            .ok_or_else(|| Error::InvalidInput("cache_size must be greater than 0".into()))?;

        let fetcher = Arc::new(CachedFetcher::new(source, capacity));
        let pool = ResolverPool::new(Arc::clone(&fetcher), config.max_workers, config.resolve_wait());
        let relay = Relay::new(RelayConfig::from_app(&config))?;

        Ok(Self {
            config: Arc::new(config),
            base_url: Arc::new(base_url),
            fetcher,
            pool: Arc::new(pool),
            relay: Arc::new(relay),
        })
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;

    /// Canned pages keyed by exact URL; anything else is an upstream 404.
    pub struct CannedPages(pub HashMap<String, String>);

    #[async_trait]
    impl PageSource for CannedPages {
        async fn fetch_text(&self, url: &str) -> Result<String, Error> {
            self.0
                .get(url)
                .cloned()
                .ok_or_else(|| Error::HttpError(format!("status 404 for {url}")))
        }
    }

    /// Never answers; every fetch hangs until dropped.
    pub struct Stalled;

    #[async_trait]
    impl PageSource for Stalled {
        async fn fetch_text(&self, _url: &str) -> Result<String, Error> {
            std::future::pending().await
        }
    }

    pub fn state_with_pages(pages: &[(&str, &str)]) -> AppState {
        let pages = pages.iter().map(|(u, b)| (u.to_string(), b.to_string())).collect();
        let config = AppConfig { base_url: "https://origin.test".into(), ..Default::default() };
        AppState::with_source(config, Arc::new(CannedPages(pages))).unwrap()
    }

    /// State whose page source stalls, with the shortest allowed fetch timeout.
    pub fn stalled_state() -> AppState {
        let config = AppConfig { base_url: "https://origin.test".into(), request_timeout_ms: 100, ..Default::default() };
        AppState::with_source(config, Arc::new(Stalled)).unwrap()
    }
}

//! Upstream HTTP fetch pipeline.
//!
//! ### Identity
//! - Every request carries a desktop browser identity (User-Agent, Referer,
//!   Accept, Accept-Language) because the origin rejects bare clients.
//!
//! ### Transport
//! - Fixed per-request timeout.
//! - Optional forward proxy for all schemes.
//! - Non-2xx responses are errors.
//!
//! ### Memoization
//! - [`CachedFetcher`] wraps any [`PageSource`] with the process-wide LRU
//!   document cache and turns every failure into the empty document.

pub mod cached;
pub mod url;

use async_trait::async_trait;
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Client, Proxy};
use std::time::{Duration, Instant};

pub use cached::CachedFetcher;
pub use url::{latest_url, search_url};

use vidrelay_core::{AppConfig, Error};

/// Accept header sent with page fetches.
const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

/// Something that can turn a URL into document text.
///
/// The seam between the memo cache and the network, so the cache and the
/// resolver pool can run against canned pages.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetch `url` and return its body as text.
    async fn fetch_text(&self, url: &str) -> Result<String, Error>;
}

/// Configuration for the fetch client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string presented to the origin.
    pub user_agent: String,

    /// Referer header value (the origin's base URL).
    pub referer: Option<String>,

    /// Request timeout (default: 8s)
    pub timeout: Duration,

    /// Forward proxy for http and https traffic.
    pub proxy: Option<String>,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        let app = AppConfig::default();
        Self {
            user_agent: app.user_agent,
            referer: None,
            timeout: Duration::from_millis(8000),
            proxy: None,
            max_redirects: 5,
        }
    }
}

impl FetchConfig {
    /// Derive fetch settings from the application configuration.
    pub fn from_app(config: &AppConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            referer: Some(config.base_url.clone()),
            timeout: config.request_timeout(),
            proxy: config.proxy().map(str::to_string),
            ..Default::default()
        }
    }
}

/// Browser identity headers shared by page fetches and the media relay.
pub fn identity_headers(referer: Option<&str>) -> Result<HeaderMap, Error> {
    let mut headers = HeaderMap::new();
    headers.insert(header::ACCEPT, HeaderValue::from_static(ACCEPT_HTML));
    headers.insert(header::ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));
    headers.insert(header::UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1"));

    if let Some(referer) = referer {
        let value = HeaderValue::from_str(referer)
            .map_err(|e| Error::InvalidInput(format!("invalid referer {referer:?}: {e}")))?;
        headers.insert(header::REFERER, value);
    }

    Ok(headers)
}

/// Build a reqwest proxy routing every scheme through `proxy_url`.
pub(crate) fn all_proxy(proxy_url: &str) -> Result<Proxy, Error> {
    Proxy::all(proxy_url).map_err(|e| Error::InvalidUrl(format!("invalid proxy {proxy_url}: {e}")))
}

/// HTTP client for origin pages.
pub struct FetchClient {
    http: Client,
    config: FetchConfig,
}

impl FetchClient {
    /// Create a new fetch client with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        let mut builder = Client::builder()
            .user_agent(&config.user_agent)
            .default_headers(identity_headers(config.referer.as_deref())?)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true);

        if let Some(proxy) = &config.proxy {
            builder = builder.proxy(all_proxy(proxy)?);
        }

        let http = builder
            .build()
            .map_err(|e| Error::HttpError(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }
}

#[async_trait]
impl PageSource for FetchClient {
    async fn fetch_text(&self, url: &str) -> Result<String, Error> {
        let start = Instant::now();

        let response = self.http.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                Error::FetchTimeout(format!("{url} after {:?}", self.config.timeout))
            } else {
                Error::HttpError(format!("network error: {}", e))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::HttpError(format!("status {} for {}", status.as_u16(), url)));
        }

        let text = response.text().await.map_err(|e| {
            if e.is_timeout() {
                Error::FetchTimeout(format!("{url} body after {:?}", self.config.timeout))
            } else {
                Error::HttpError(format!("failed to read response: {}", e))
            }
        })?;

        tracing::debug!("fetched {} in {}ms ({} chars)", url, start.elapsed().as_millis(), text.len());

        Ok(text)
    }
}

//! Streaming media relay.
//!
//! Forwards one request (optionally ranged) to an upstream media URL and hands
//! back the upstream status, a filtered header set and a body stream. The body
//! is never buffered; it is re-framed into chunks of at most `chunk_size`
//! bytes and pulled only as fast as the consumer drains it.

mod chunk;

pub use chunk::rechunk;

use bytes::Bytes;
use futures_util::StreamExt;
use futures_util::stream::BoxStream;
use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, StatusCode};
use std::time::Duration;

use vidrelay_core::{AppConfig, Error};

use crate::fetch::{all_proxy, identity_headers};

/// Content type assumed when upstream does not send one.
pub const DEFAULT_CONTENT_TYPE: &str = "video/mp4";

/// Upstream headers copied onto the relayed response.
const PASSTHROUGH: [HeaderName; 4] =
    [header::CONTENT_RANGE, header::ACCEPT_RANGES, header::CONTENT_LENGTH, header::CACHE_CONTROL];

/// Relay client settings.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub user_agent: String,
    pub referer: Option<String>,
    pub connect_timeout: Duration,
    /// Idle bound between body reads; there is no whole-transfer limit.
    pub read_timeout: Duration,
    pub proxy: Option<String>,
    pub chunk_size: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self::from_app(&AppConfig::default())
    }
}

impl RelayConfig {
    pub fn from_app(config: &AppConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            referer: Some(config.base_url.clone()),
            connect_timeout: config.request_timeout(),
            read_timeout: config.request_timeout(),
            proxy: config.proxy().map(str::to_string),
            chunk_size: config.relay_chunk_size,
        }
    }
}

/// Upstream response ready to be piped to a client.
pub struct RelayResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: BoxStream<'static, Result<Bytes, Error>>,
}

impl std::fmt::Debug for RelayResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

/// Pass-through client for media bytes.
pub struct Relay {
    http: Client,
    config: RelayConfig,
}

impl Relay {
    pub fn new(config: RelayConfig) -> Result<Self, Error> {
        let mut headers = identity_headers(config.referer.as_deref())?;
        headers.insert(header::ACCEPT, HeaderValue::from_static("*/*"));

        let mut builder = Client::builder()
            .user_agent(&config.user_agent)
            .default_headers(headers)
            .connect_timeout(config.connect_timeout)
            .read_timeout(config.read_timeout)
            .use_rustls_tls()
            .no_gzip()
            .no_brotli()
            .no_deflate();

        if let Some(proxy) = &config.proxy {
            builder = builder.proxy(all_proxy(proxy)?);
        }

        let http = builder
            .build()
            .map_err(|e| Error::RelayFailed(format!("failed to build relay client: {}", e)))?;

        Ok(Self { http, config })
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// Open `url` upstream, forwarding `range` verbatim when present.
    ///
    /// Only failing to get a response is an error; any upstream status,
    /// 416 included, is relayed as is.
    pub async fn relay(&self, url: &str, range: Option<&HeaderValue>) -> Result<RelayResponse, Error> {
        let mut request = self.http.get(url);
        if let Some(range) = range {
            request = request.header(header::RANGE, range.clone());
        }

        let response = request.send().await.map_err(|e| {
            tracing::error!(url = url, "relay upstream unreachable: {}", e);
            Error::RelayFailed(e.to_string())
        })?;

        let status = response.status();
        let headers = relay_headers(response.headers());
        tracing::debug!(url = url, status = status.as_u16(), ranged = range.is_some(), "relaying upstream media");

        let upstream = response.bytes_stream().map(|chunk| chunk.map_err(|e| Error::RelayFailed(e.to_string())));
        let body = rechunk(upstream, self.config.chunk_size).boxed();

        Ok(RelayResponse { status, headers, body })
    }
}

/// Build the response headers for a relayed upstream response.
pub fn relay_headers(upstream: &HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::new();

    let content_type = upstream
        .get(header::CONTENT_TYPE)
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static(DEFAULT_CONTENT_TYPE));
    headers.insert(header::CONTENT_TYPE, content_type);

    for name in PASSTHROUGH {
        if let Some(value) = upstream.get(&name) {
            headers.insert(name, value.clone());
        }
    }
    if !headers.contains_key(header::ACCEPT_RANGES) {
        headers.insert(header::ACCEPT_RANGES, HeaderValue::from_static("bytes"));
    }

    apply_cors(&mut headers);
    headers
}

/// Permissive cross-origin headers for browser players on other origins.
pub fn apply_cors(headers: &mut HeaderMap) {
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(header::ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static("GET, OPTIONS"));
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Range, Origin, X-Requested-With"),
    );
}

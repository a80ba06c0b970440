//! HTTP routes.
//!
//! - `GET /` listing or search page; JSON for XHR callers.
//! - `GET /resolve?url=` page URL to streams, tags and title.
//! - `GET /stream?url=` media relay, range aware.
//! - `GET /health` liveness plus cache and pool occupancy.

use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use vidrelay_client::relay::apply_cors;
use vidrelay_client::{Resolution, extract_popular_tags, extract_videos, latest_url, search_url};
use vidrelay_core::CacheStats;

use crate::error::WebError;
use crate::render::{self, ListingPage};
use crate::state::AppState;

const SERVICE: &str = "vidrelay";

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(listing))
        .route("/resolve", get(resolve))
        .route("/stream", get(stream).options(preflight))
        .route("/health", get(health))
        .fallback(not_found)
        .with_state(state)
}

#[derive(Debug, Default, Deserialize)]
struct ListingParams {
    page: Option<String>,
    q: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct UrlParam {
    url: Option<String>,
}

impl UrlParam {
    fn non_empty(self) -> Option<String> {
        self.url.filter(|u| !u.trim().is_empty())
    }
}

#[derive(Debug, Serialize)]
struct Health {
    status: &'static str,
    service: &'static str,
    version: &'static str,
    timestamp: String,
    cache: CacheStats,
    in_flight: usize,
}

/// Page numbers below 1 or unparsable fall back to the first page.
fn parse_page(raw: Option<&str>) -> u32 {
    raw.and_then(|p| p.trim().parse::<u32>().ok()).filter(|p| *p > 0).unwrap_or(1)
}

fn is_xhr(headers: &HeaderMap) -> bool {
    headers
        .get("x-requested-with")
        .is_some_and(|v| v.as_bytes().eq_ignore_ascii_case(b"XMLHttpRequest"))
}

async fn listing(State(state): State<AppState>, Query(params): Query<ListingParams>, headers: HeaderMap) -> Response {
    let page = parse_page(params.page.as_deref());
    let query = params.q.as_deref().map(str::trim).unwrap_or_default();

    let url = if query.is_empty() {
        latest_url(&state.config.base_url, page)
    } else {
        search_url(&state.config.base_url, query, page)
    };

    let html = state.fetcher.fetch(&url).await;
    let videos = extract_videos(&html, &state.base_url);
    let tags = extract_popular_tags(&html);
    tracing::debug!(url = %url, page, query, "listing: {} videos, {} tags", videos.len(), tags.len());

    if is_xhr(&headers) {
        return Json(videos).into_response();
    }

    Html(render::listing(&ListingPage {
        videos: &videos,
        tags: &tags,
        current_page: page,
        query,
        proxy_enabled: state.config.use_proxy,
    }))
    .into_response()
}

async fn resolve(State(state): State<AppState>, Query(params): Query<UrlParam>) -> (StatusCode, Json<Resolution>) {
    let Some(url) = params.non_empty() else {
        tracing::warn!("resolve requested without url");
        return (StatusCode::BAD_REQUEST, Json(Resolution::default()));
    };

    let result = state.pool.resolve(&url).await;
    tracing::debug!(url = %url, "resolve: {} streams, {} tags", result.streams.len(), result.tags.len());
    (StatusCode::OK, Json(result))
}

async fn stream(
    State(state): State<AppState>, Query(params): Query<UrlParam>, headers: HeaderMap,
) -> Result<Response, WebError> {
    let Some(raw) = params.non_empty() else {
        tracing::warn!("stream requested without url");
        return Err(WebError::MissingUrl);
    };

    let url = html_escape::decode_html_entities(&raw);
    let upstream = state.relay.relay(&url, headers.get(header::RANGE)).await?;

    let mut response = Response::new(Body::from_stream(upstream.body));
    *response.status_mut() = upstream.status;
    *response.headers_mut() = upstream.headers;
    Ok(response)
}

async fn preflight() -> Response {
    let mut response = StatusCode::OK.into_response();
    apply_cors(response.headers_mut());
    response
}

async fn health(State(state): State<AppState>) -> Json<Health> {
    Json(Health {
        status: "healthy",
        service: SERVICE,
        version: env!("CARGO_PKG_VERSION"),
        timestamp: chrono::Utc::now().to_rfc3339(),
        cache: state.fetcher.stats().await,
        in_flight: state.pool.len().await,
    })
}

async fn not_found(State(state): State<AppState>) -> (StatusCode, Html<String>) {
    (StatusCode::NOT_FOUND, Html(render::listing(&ListingPage::empty(state.config.use_proxy))))
}

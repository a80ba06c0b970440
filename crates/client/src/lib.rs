//! Client code for vidrelay.
//!
//! This crate provides the upstream HTTP client, the memoizing fetcher, markup
//! extraction, the resolver worker pool and the streaming media relay shared
//! by the server.

pub mod extract;
pub mod fetch;
pub mod relay;
pub mod resolve;

pub use extract::{Resolution, VideoRecord, extract_popular_tags, extract_videos, resolve_page};

pub use fetch::{CachedFetcher, FetchClient, FetchConfig, PageSource, latest_url, search_url};
pub use relay::{Relay, RelayConfig, RelayResponse};
pub use resolve::{ResolveHandle, ResolverPool, TaskState};

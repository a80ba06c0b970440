//! vidrelay server entry point.
//!
//! Boots the HTTP front: listing pages, page resolution through the worker
//! pool, the media relay and a health probe. Logs are JSON on stderr.

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;
use vidrelay_core::AppConfig;

mod error;
mod reaper;
mod render;
mod routes;
mod state;

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load().context("failed to load configuration")?;

    let default_level = if config.debug_mode { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with_writer(std::io::stderr)
        .json()
        .init();

    tracing::info!(
        bind = %config.bind,
        base_url = %config.base_url,
        proxy = config.proxy().unwrap_or("none"),
        max_workers = config.max_workers,
        cache_size = config.cache_size,
        request_timeout_ms = config.request_timeout_ms,
        "starting vidrelay"
    );

    let state = state::AppState::build(config).context("failed to build application state")?;
    let _reaper = reaper::spawn(&state);

    let bind = state.config.bind.clone();
    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("failed to bind {bind}"))?;

    axum::serve(listener, routes::router(state)).await.context("server shutdown")?;

    Ok(())
}

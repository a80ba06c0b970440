//! Periodic sweep of the admission table.

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::state::AppState;

/// Start the reaper ticker; `None` when the interval is zero.
pub fn spawn(state: &AppState) -> Option<JoinHandle<()>> {
    let period = state.config.reaper_interval();
    if period.is_zero() {
        tracing::warn!("reaper disabled");
        return None;
    }

    let state = state.clone();
    Some(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // first tick completes immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;
            sweep(&state).await;
        }
    }))
}

/// One reaper pass. Returns how many entries were removed.
pub async fn sweep(state: &AppState) -> usize {
    let removed = state.pool.reap().await;
    let cache = state.fetcher.stats().await;
    let in_flight = state.pool.len().await;

    tracing::debug!(
        removed,
        in_flight,
        cache_len = cache.len,
        cache_capacity = cache.capacity,
        cache_hits = cache.hits,
        cache_misses = cache.misses,
        "reaper sweep"
    );

    removed
}

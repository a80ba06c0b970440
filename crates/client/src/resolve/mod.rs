//! Admission-controlled worker pool that resolves video pages.
//!
//! ### Submission
//! - `submit` registers the page URL in a bounded [`AdmissionTable`]; when
//!   full, the oldest submission is cancelled and dropped to make room.
//! - The task waits for one of `capacity` worker slots, fetches the page
//!   through the [`CachedFetcher`] and extracts streams, tags and title.
//!
//! ### Waiting
//! - [`ResolveHandle::wait`] blocks up to a timeout. Timeouts, cancellation and
//!   internal failures all yield [`Resolution::default`]; nothing propagates
//!   as an error.
//! - A caller timing out does not cancel the task; it may still finish and
//!   warm the fetch cache.
//!
//! The admission table is only swept by overflow eviction and [`ResolverPool::reap`].

pub mod task;

pub use task::{TaskHandle, TaskState};

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::{Semaphore, oneshot};
use vidrelay_core::{AdmissionTable, Error};

use crate::extract::{Resolution, resolve_page};
use crate::fetch::CachedFetcher;

/// Caller's side of a submitted resolution.
#[derive(Debug)]
pub struct ResolveHandle {
    page_url: String,
    task: TaskHandle,
    result: oneshot::Receiver<Resolution>,
}

impl ResolveHandle {
    pub fn page_url(&self) -> &str {
        &self.page_url
    }

    pub fn state(&self) -> TaskState {
        self.task.state()
    }

    /// Block up to `timeout` for the result; the empty resolution otherwise.
    pub async fn wait(self, timeout: Duration) -> Resolution {
        match tokio::time::timeout(timeout, self.result).await {
            Ok(Ok(resolution)) => resolution,
            Ok(Err(_)) => {
                tracing::debug!(url = %self.page_url, task = self.task.id(), "resolution cancelled before completing");
                Resolution::default()
            }
            Err(_) => {
                tracing::error!(url = %self.page_url, task = self.task.id(), "resolution timed out after {:?}", timeout);
                Resolution::default()
            }
        }
    }
}

/// Fixed-size resolver pool behind an admission table.
pub struct ResolverPool {
    fetcher: Arc<CachedFetcher>,
    slots: Arc<Semaphore>,
    table: AdmissionTable<TaskHandle>,
    next_id: AtomicU64,
    wait: Duration,
}

impl ResolverPool {
    /// Create a pool with `capacity` worker slots and admission entries.
    ///
    /// `wait` is the bound used by [`ResolverPool::resolve`]; keep it above the
    /// fetch timeout so fetches can finish or fail before callers give up.
    pub fn new(fetcher: Arc<CachedFetcher>, capacity: usize, wait: Duration) -> Self {
        let table = AdmissionTable::new(capacity);
        Self {
            fetcher,
            slots: Arc::new(Semaphore::new(table.capacity())),
            table,
            next_id: AtomicU64::new(1),
            wait,
        }
    }

    /// Admit `page_url` and start resolving it.
    pub async fn submit(&self, page_url: &str) -> ResolveHandle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);

        let admission = self
            .table
            .admit(page_url.to_string(), || {
                let task = TaskHandle::new(id);
                let (tx, rx) = oneshot::channel();

                tokio::spawn(run_task(
                    Arc::clone(&self.fetcher),
                    Arc::clone(&self.slots),
                    task.clone(),
                    page_url.to_string(),
                    tx,
                ));

                (task.clone(), (task, rx))
            })
            .await;

        if let Some(evicted) = &admission.evicted {
            tracing::debug!(url = page_url, evicted = %evicted, "admission table full, cancelled oldest resolution");
        }
        if admission.replaced {
            tracing::debug!(url = page_url, "resubmitted while in flight, previous task detached");
        }

        let (task, result) = admission.output;
        ResolveHandle { page_url: page_url.to_string(), task, result }
    }

    /// Wait on a submitted handle; the empty resolution on timeout or cancellation.
    pub async fn wait(&self, handle: ResolveHandle, timeout: Duration) -> Resolution {
        handle.wait(timeout).await
    }

    /// Submit and wait with the pool's configured bound.
    pub async fn resolve(&self, page_url: &str) -> Resolution {
        self.submit(page_url).await.wait(self.wait).await
    }

    /// Drop finished and cancelled entries from the admission table.
    pub async fn reap(&self) -> usize {
        let removed = self.table.reap().await;
        for url in &removed {
            tracing::debug!(url = %url, "removing completed resolution");
        }
        removed.len()
    }

    /// Page URLs currently admitted, oldest first.
    pub async fn in_flight(&self) -> Vec<String> {
        self.table.keys().await
    }

    pub async fn len(&self) -> usize {
        self.table.len().await
    }

    pub async fn is_empty(&self) -> bool {
        self.table.is_empty().await
    }

    pub fn capacity(&self) -> usize {
        self.table.capacity()
    }

    pub fn wait_bound(&self) -> Duration {
        self.wait
    }
}

async fn run_task(
    fetcher: Arc<CachedFetcher>, slots: Arc<Semaphore>, task: TaskHandle, page_url: String,
    tx: oneshot::Sender<Resolution>,
) {
    let work = async {
        let _permit = slots.acquire_owned().await.map_err(|_| Error::Cancelled)?;
        if !task.start() {
            return Err(Error::Cancelled);
        }

        let html = fetcher.fetch(&page_url).await;
        if task.is_cancelled() {
            return Err(Error::Cancelled);
        }

        tokio::task::spawn_blocking(move || resolve_page(&html))
            .await
            .map_err(|e| Error::ExtractFailed(e.to_string()))
    };

    let outcome = tokio::select! {
        _ = task.cancelled() => Err(Error::Cancelled),
        result = work => result,
    };

    match outcome {
        Ok(resolution) => {
            task.finish();
            tracing::debug!(
                url = %page_url,
                "resolved {} streams, {} tags",
                resolution.streams.len(),
                resolution.tags.len()
            );
            let _ = tx.send(resolution);
        }
        Err(Error::Cancelled) => {
            tracing::debug!(url = %page_url, task = task.id(), "resolution task stopped after cancellation");
        }
        Err(e) => {
            task.finish();
            tracing::error!(url = %page_url, "error resolving stream and tags: {}", e);
            let _ = tx.send(Resolution::default());
        }
    }
}

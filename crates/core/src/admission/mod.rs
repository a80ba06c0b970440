//! Bounded, insertion-ordered registry of in-flight work.
//!
//! ### Admission
//! - Keyed by page URL; iteration order is submission order.
//! - When the table already holds `capacity` entries, the oldest entry is
//!   cancelled and removed before the new one is inserted, whether or not it
//!   already finished. Newer requests win over completing older ones.
//! - Re-submitting a key that is still present replaces its value in place
//!   (same position, old value dropped without cancellation). There is no
//!   single-flight guarantee per key.
//!
//! ### Linearizability
//! Capacity check, eviction, insertion and sweeps all run under one mutex, so
//! `len() <= capacity` holds after every admission.

use indexmap::IndexMap;
use tokio::sync::Mutex;

/// A value tracked by an [`AdmissionTable`].
pub trait Admitted {
    /// Finished or cancelled; safe to sweep.
    fn is_terminal(&self) -> bool;

    /// Ask the underlying work to stop. Must not block.
    fn cancel(&self);
}

/// Outcome of a single admission.
#[derive(Debug)]
pub struct Admission<R> {
    /// Whatever the start closure handed back to the submitter.
    pub output: R,
    /// Key of the entry evicted to make room, if any.
    pub evicted: Option<String>,
    /// Whether an entry with the same key was overwritten.
    pub replaced: bool,
}

/// Capacity-bounded map with atomic insert-with-eviction.
#[derive(Debug)]
pub struct AdmissionTable<V> {
    capacity: usize,
    entries: Mutex<IndexMap<String, V>>,
}

impl<V: Admitted> AdmissionTable<V> {
    /// Create a table admitting at most `capacity` live entries.
    ///
    /// A capacity of zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self { capacity, entries: Mutex::new(IndexMap::with_capacity(capacity)) }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Admit `key`, evicting the oldest entry first if the table is full.
    ///
    /// `start` runs while the lock is held and must not block; it returns the
    /// value to register plus an output handed back to the caller.
    pub async fn admit<R>(&self, key: String, start: impl FnOnce() -> (V, R)) -> Admission<R> {
        let mut entries = self.entries.lock().await;

        let evicted = if entries.len() >= self.capacity {
            entries.shift_remove_index(0).map(|(oldest, value)| {
                value.cancel();
                oldest
            })
        } else {
            None
        };

        let (value, output) = start();
        let replaced = entries.insert(key, value).is_some();

        Admission { output, evicted, replaced }
    }

    /// Remove every entry whose work reached a terminal state.
    ///
    /// Returns the removed keys in submission order.
    pub async fn reap(&self) -> Vec<String> {
        let mut entries = self.entries.lock().await;
        let mut removed = Vec::new();
        entries.retain(|key, value| {
            if value.is_terminal() {
                removed.push(key.clone());
                false
            } else {
                true
            }
        });
        removed
    }

    /// Keys currently admitted, oldest first.
    pub async fn keys(&self) -> Vec<String> {
        self.entries.lock().await.keys().cloned().collect()
    }

    pub async fn contains(&self, key: &str) -> bool {
        self.entries.lock().await.contains_key(key)
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[derive(Clone, Default)]
    struct Probe {
        done: Arc<AtomicBool>,
        cancelled: Arc<AtomicBool>,
    }

    impl Admitted for Probe {
        fn is_terminal(&self) -> bool {
            self.done.load(Ordering::SeqCst) || self.cancelled.load(Ordering::SeqCst)
        }

        fn cancel(&self) {
            self.cancelled.store(true, Ordering::SeqCst);
        }
    }

    async fn submit(table: &AdmissionTable<Probe>, key: &str) -> (Probe, Admission<()>) {
        let probe = Probe::default();
        let registered = probe.clone();
        let admission = table.admit(key.to_string(), move || (registered, ())).await;
        (probe, admission)
    }

    #[tokio::test]
    async fn test_admits_without_eviction_below_capacity() {
        let table = AdmissionTable::new(3);
        for key in ["a", "b", "c"] {
            let (_, admission) = submit(&table, key).await;
            assert!(admission.evicted.is_none());
        }
        assert_eq!(table.keys().await, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_evicts_oldest_when_full() {
        let table = AdmissionTable::new(2);
        let (a, _) = submit(&table, "a").await;
        let (b, _) = submit(&table, "b").await;
        let (_, admission) = submit(&table, "c").await;

        assert_eq!(admission.evicted.as_deref(), Some("a"));
        assert!(a.cancelled.load(Ordering::SeqCst));
        assert!(!b.cancelled.load(Ordering::SeqCst));
        assert!(!table.contains("a").await);
        assert_eq!(table.keys().await, vec!["b", "c"]);
    }

    #[tokio::test]
    async fn test_evicts_even_when_oldest_finished() {
        let table = AdmissionTable::new(1);
        let (a, _) = submit(&table, "a").await;
        a.done.store(true, Ordering::SeqCst);

        let (_, admission) = submit(&table, "b").await;
        assert_eq!(admission.evicted.as_deref(), Some("a"));
        assert_eq!(table.keys().await, vec!["b"]);
    }

    #[tokio::test]
    async fn test_exactly_one_eviction_per_overflow() {
        let table = AdmissionTable::new(2);
        let mut evictions = Vec::new();
        for key in ["a", "b", "c", "d", "e"] {
            let (_, admission) = submit(&table, key).await;
            evictions.extend(admission.evicted);
            assert!(table.len().await <= 2);
        }
        assert_eq!(evictions, vec!["a", "b", "c"]);
        assert_eq!(table.keys().await, vec!["d", "e"]);
    }

    #[tokio::test]
    async fn test_resubmit_replaces_in_place() {
        let table = AdmissionTable::new(3);
        let (first, _) = submit(&table, "a").await;
        submit(&table, "b").await;
        let (_, admission) = submit(&table, "a").await;

        assert!(admission.replaced);
        assert!(admission.evicted.is_none());
        assert!(!first.cancelled.load(Ordering::SeqCst));
        assert_eq!(table.keys().await, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_reap_removes_only_terminal_entries() {
        let table = AdmissionTable::new(4);
        let (a, _) = submit(&table, "a").await;
        let (_b, _) = submit(&table, "b").await;
        let (c, _) = submit(&table, "c").await;
        a.done.store(true, Ordering::SeqCst);
        c.cancel();

        let removed = table.reap().await;
        assert_eq!(removed, vec!["a", "c"]);
        assert_eq!(table.keys().await, vec!["b"]);
    }

    #[tokio::test]
    async fn test_zero_capacity_treated_as_one() {
        let table: AdmissionTable<Probe> = AdmissionTable::new(0);
        assert_eq!(table.capacity(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_admissions_stay_bounded() {
        let table = Arc::new(AdmissionTable::new(3));
        let mut handles = Vec::new();
        for i in 0..32 {
            let table = Arc::clone(&table);
            handles.push(tokio::spawn(async move {
                let probe = Probe::default();
                table.admit(format!("k{i}"), move || (probe, ())).await;
                table.len().await
            }));
        }
        for handle in handles {
            assert!(handle.await.unwrap() <= 3);
        }
        assert_eq!(table.len().await, 3);
    }
}

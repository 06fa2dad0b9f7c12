//! Operation counters for the cache.
//!
//! Counters use `AtomicU64` with relaxed ordering so they can be bumped
//! outside the cache mutex. [`CacheMetrics`] is the plain snapshot handed to
//! callers; counts from a racing snapshot may be mutually off by in-flight
//! operations but each counter is individually exact.

use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time snapshot of cache activity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheMetrics {
    /// Accesses that pinned an already-published entry.
    pub hits: u64,
    /// Accesses that had to install a placeholder and load.
    pub misses: u64,
    /// Loader invocations.
    pub loads: u64,
    /// Loader invocations that returned an error.
    pub load_failures: u64,
    /// Entries evicted or purged (each triggered one finalizer call).
    pub evictions: u64,
}

/// Internal counters; see [`CacheMetrics`] for the reader-facing view.
#[derive(Debug, Default)]
pub(crate) struct CacheCounters {
    hits: AtomicU64,
    misses: AtomicU64,
    loads: AtomicU64,
    load_failures: AtomicU64,
    evictions: AtomicU64,
}

impl CacheCounters {
    pub(crate) fn snapshot(&self) -> CacheMetrics {
        CacheMetrics {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            loads: self.loads.load(Ordering::Relaxed),
            load_failures: self.load_failures.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }

    pub(crate) fn inc_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn inc_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn inc_load(&self) {
        self.loads.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn inc_load_failure(&self) {
        self.load_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn inc_eviction(&self) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
    }
}

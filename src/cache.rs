//! # Loading cache core with pin-on-use access
//!
//! This module provides [`LoadingCache`], a bounded concurrent cache that
//! fills itself through a caller-supplied loader and hands out values only
//! for the duration of a scoped callback.
//!
//! ## Architecture
//!
//! ```text
//!   ┌──────────────────────────────────────────────────────────────────┐
//!   │                       LoadingCache<K, V>                         │
//!   │                                                                  │
//!   │   loader / finalizer / scavenger          (immutable, unlocked)  │
//!   │                                                                  │
//!   │   ┌──────────────────────────────────────────────────────────┐   │
//!   │   │                  Mutex<Inner<K, V>>                      │   │
//!   │   │                                                          │   │
//!   │   │   index: FxHashMap<K, EntryId>                           │   │
//!   │   │   entries: ResidencyTable<Entry<K, V>>                   │   │
//!   │   │     pins, weights, recency order, victim selection       │   │
//!   │   │                                                          │   │
//!   │   │   head ─► [MRU] ◄──► [..] ◄──► [LRU] ◄── tail            │   │
//!   │   └──────────────────────────────────────────────────────────┘   │
//!   └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Access flow
//!
//! ```text
//!   do_with(key, f)
//!     │
//!     ├─► HIT (entry published)
//!     │     pin (refreshes recency), unlock, run f(&value),
//!     │     relock, unpin
//!     │
//!     ├─► LOAD IN FLIGHT
//!     │     wait on the entry condvar, then restart the lookup
//!     │
//!     └─► MISS
//!           install Loading placeholder (pinned by the inserter),
//!           unlock, run loader, compute weight, relock, select and
//!           evict victims LRU-first (skipping pinned entries),
//!           publish, notify waiters, unlock, run f(&value), relock,
//!           unpin
//! ```
//!
//! ## Guarantees
//!
//! | Property          | Mechanism                                          |
//! |-------------------|----------------------------------------------------|
//! | Pinned residency  | a pinned entry is never selected as a victim       |
//! | Loader dedup      | placeholder + condvar; one load per outstanding miss |
//! | Recency           | every successful pin moves the entry to the head   |
//! | Weight bound      | resident weight <= capacity after every admission  |
//! | Finalizer exactness | one call per published entry that leaves the cache |
//!
//! The cache mutex is never held while the loader or the access callback
//! runs. The finalizer runs with the mutex held and must not call back into
//! the cache; neither may a loader re-enter the cache for the key it is
//! loading (it would deadlock on its own placeholder).
//!
//! Admission never blocks on pin release: when every resident entry is
//! pinned and room is required, the incoming caller fails with
//! [`CacheError::NotEnoughSpace`] instead of waiting.
//!
//! ## Example
//!
//! ```
//! use loadcache::builder::CacheBuilder;
//!
//! let cache = CacheBuilder::new()
//!     .with_loader(|key: &u64| Ok(key * 2))
//!     .with_capacity(128)
//!     .build();
//!
//! let doubled = cache.do_with(21, |v| Ok(*v)).unwrap();
//! assert_eq!(doubled, 42);
//! ```

use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use parking_lot::{Condvar, Mutex, MutexGuard};
use rustc_hash::FxHashMap;

use crate::ds::{EntryId, ResidencyTable};
use crate::error::CacheError;
use crate::metrics::{CacheCounters, CacheMetrics};
use crate::scavenger::Scavenger;

/// Caller-supplied function producing a value for a missing key.
///
/// Return [`CacheError::NoSuchItem`] to mark the key as absent; any other
/// error is surfaced verbatim to the caller that triggered the load. Runs
/// without the cache mutex and must not re-enter the cache for the same key.
pub type Loader<K, V> = Box<dyn Fn(&K) -> Result<V, CacheError> + Send + Sync>;

/// Caller-supplied hook invoked once per entry that leaves the cache.
///
/// Runs with the cache mutex held: keep it cheap and never call back into
/// the cache from it.
pub type Finalizer<K, V> = Box<dyn Fn(&K, &V) -> Result<(), CacheError> + Send + Sync>;

enum EntryState<V> {
    /// Loader in flight; waiters block on the entry condvar.
    Loading,
    /// Value published; residency bookkeeping lives in the table.
    Ready(Arc<V>),
}

struct Entry<K, V> {
    key: K,
    state: EntryState<V>,
    /// Wakes callers blocked on this entry's load resolving either way.
    waiters: Arc<Condvar>,
}

struct Inner<K, V> {
    index: FxHashMap<K, EntryId>,
    entries: ResidencyTable<Entry<K, V>>,
}

impl<K: Eq + Hash, V> Inner<K, V> {
    /// Drops a never-published placeholder and wakes its waiters, who will
    /// restart their lookup from scratch.
    fn discard_placeholder(&mut self, id: EntryId) {
        if let Some(entry) = self.entries.remove(id) {
            self.index.remove(&entry.key);
            entry.waiters.notify_all();
        }
    }
}

/// Bounded concurrent cache with pluggable loading, LRU eviction, and
/// pin-on-use scoped access.
///
/// Construct one through [`CacheBuilder`](crate::builder::CacheBuilder).
/// All methods take `&self`; the cache is safe to share across threads
/// (`Arc<LoadingCache<K, V>>` or a plain borrow).
pub struct LoadingCache<K, V> {
    inner: Mutex<Inner<K, V>>,
    loader: Loader<K, V>,
    finalizer: Option<Finalizer<K, V>>,
    scavenger: Scavenger<K>,
    counters: CacheCounters,
}

/// Releases a pin when the access callback returns or unwinds.
struct PinGuard<'a, K, V> {
    cache: &'a LoadingCache<K, V>,
    id: EntryId,
}

impl<K, V> Drop for PinGuard<'_, K, V> {
    fn drop(&mut self) {
        self.cache.unpin(self.id);
    }
}

impl<K, V> LoadingCache<K, V>
where
    K: Eq + Hash + Clone,
{
    pub(crate) fn new(
        loader: Loader<K, V>,
        finalizer: Option<Finalizer<K, V>>,
        scavenger: Scavenger<K>,
    ) -> Self {
        // In count mode the capacity bounds the number of slots ever resident
        // at once, so both the index and the table can preallocate.
        let prealloc = match &scavenger {
            Scavenger::Count { capacity } => *capacity as usize,
            _ => 0,
        };
        LoadingCache {
            inner: Mutex::new(Inner {
                index: FxHashMap::with_capacity_and_hasher(prealloc, Default::default()),
                entries: ResidencyTable::with_capacity(prealloc),
            }),
            loader,
            finalizer,
            scavenger,
            counters: CacheCounters::default(),
        }
    }

    /// Runs `f` against the value for `key`, loading it on demand.
    ///
    /// For the entire duration of `f` the entry is pinned: it stays resident
    /// and is never finalized concurrently. Concurrent callers for the same
    /// key share one pinned entry and may run their callbacks simultaneously;
    /// on a shared miss exactly one of them invokes the loader while the
    /// rest wait.
    ///
    /// Returns whatever `f` returns, or:
    /// - [`CacheError::NoSuchItem`] when the loader reports the key absent,
    /// - [`CacheError::NotEnoughSpace`] when the entry cannot be admitted
    ///   even after evicting every unpinned entry,
    /// - any loader, finalizer, or callback error, surfaced verbatim.
    ///
    /// A loader error leaves no trace in the cache. A finalizer error raised
    /// while making room is returned to this caller; the evicted victim
    /// stays evicted and the candidate is not inserted. A callback error
    /// leaves the entry resident.
    ///
    /// # Example
    ///
    /// ```
    /// use loadcache::builder::CacheBuilder;
    ///
    /// let cache = CacheBuilder::new()
    ///     .with_loader(|key: &String| Ok(key.len()))
    ///     .with_capacity(4)
    ///     .build();
    ///
    /// let len = cache.do_with("hello".to_string(), |v| Ok(*v)).unwrap();
    /// assert_eq!(len, 5);
    /// ```
    pub fn do_with<R, F>(&self, key: K, f: F) -> Result<R, CacheError>
    where
        F: FnOnce(&V) -> Result<R, CacheError>,
    {
        let (id, value) = self.pin(key)?;
        let _pin = PinGuard { cache: self, id };
        f(&value)
    }

    /// Evicts and finalizes every unpinned published entry, oldest first.
    ///
    /// Returns the first finalizer error; entries finalized before the
    /// failure stay evicted. In-flight loads and pinned entries are left
    /// untouched.
    pub fn purge(&self) -> Result<(), CacheError> {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        for id in inner.entries.unpinned_residents() {
            self.evict(inner, id)?;
        }
        Ok(())
    }

    /// Returns `true` if `key` is currently published.
    ///
    /// In-flight loads do not count; this never blocks on a loader.
    pub fn contains(&self, key: &K) -> bool {
        let guard = self.inner.lock();
        guard
            .index
            .get(key)
            .and_then(|&id| guard.entries.get(id))
            .map_or(false, |entry| matches!(entry.state, EntryState::Ready(_)))
    }

    /// Returns the number of published entries.
    pub fn len(&self) -> usize {
        self.inner.lock().entries.resident_len()
    }

    /// Returns `true` if no entry is published.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the total weight budget, or `None` when unbounded.
    pub fn capacity(&self) -> Option<u64> {
        self.scavenger.capacity()
    }

    /// Returns the summed weight of published entries.
    ///
    /// In count mode (and unbounded mode) every entry weighs 1, so this
    /// equals [`len`](Self::len).
    pub fn used_weight(&self) -> u64 {
        self.inner.lock().entries.resident_weight()
    }

    /// Returns a snapshot of the operation counters.
    pub fn metrics(&self) -> CacheMetrics {
        self.counters.snapshot()
    }

    /// Pins the entry for `key`, loading it first if necessary.
    ///
    /// Returns the entry id (for the later unpin) and the value, with the
    /// pin taken and the recency position refreshed.
    fn pin(&self, key: K) -> Result<(EntryId, Arc<V>), CacheError> {
        let mut guard = self.inner.lock();
        loop {
            let existing = guard.index.get(&key).copied();
            let Some(id) = existing else {
                self.counters.inc_miss();
                return self.load(guard, key);
            };

            let inner = &mut *guard;
            let entry = inner.entries.get(id).expect("indexed entry is live");
            match entry.state {
                EntryState::Ready(ref value) => {
                    let value = Arc::clone(value);
                    inner.entries.pin(id);
                    self.counters.inc_hit();
                    return Ok((id, value));
                },
                EntryState::Loading => {
                    // Wait for the in-flight load to resolve, then restart
                    // the lookup: the entry may have been published, or
                    // discarded on failure (in which case this caller starts
                    // a fresh load of its own).
                    let waiters = Arc::clone(&entry.waiters);
                    waiters.wait(&mut guard);
                },
            }
        }
    }

    /// Miss path: installs a placeholder, runs the loader unlocked, then
    /// admits and publishes the value.
    fn load(
        &self,
        mut guard: MutexGuard<'_, Inner<K, V>>,
        key: K,
    ) -> Result<(EntryId, Arc<V>), CacheError> {
        let id = guard.entries.insert(Entry {
            key: key.clone(),
            state: EntryState::Loading,
            waiters: Arc::new(Condvar::new()),
        });
        guard.index.insert(key.clone(), id);
        drop(guard);

        self.counters.inc_load();
        let loaded = (self.loader)(&key);
        // Weight is computed outside the lock as well; user weight functions
        // may be arbitrarily slow.
        let weight = match &loaded {
            Ok(_) => self.scavenger.weight(&key),
            Err(_) => 0,
        };

        let mut guard = self.inner.lock();
        let value = match loaded {
            Ok(value) => Arc::new(value),
            Err(err) => {
                self.counters.inc_load_failure();
                guard.discard_placeholder(id);
                return Err(err);
            },
        };

        if let Err(err) = self.make_room(&mut guard, weight) {
            guard.discard_placeholder(id);
            return Err(err);
        }

        let inner = &mut *guard;
        let entry = inner.entries.get_mut(id).expect("placeholder entry is live");
        entry.state = EntryState::Ready(Arc::clone(&value));
        entry.waiters.notify_all();
        inner.entries.publish(id, weight);
        Ok((id, value))
    }

    /// Admission pass: ensures `incoming` additional weight fits, evicting
    /// unpinned entries LRU-first when needed.
    ///
    /// Victim selection commits to nothing, so a failed admission leaves the
    /// cache untouched.
    fn make_room(&self, inner: &mut Inner<K, V>, incoming: u64) -> Result<(), CacheError> {
        let Some(capacity) = self.scavenger.capacity() else {
            return Ok(());
        };
        let Some(victims) = inner.entries.select_victims(incoming, capacity) else {
            return Err(CacheError::NotEnoughSpace);
        };
        for id in victims {
            self.evict(inner, id)?;
        }
        Ok(())
    }

    /// Removes one published entry and runs the finalizer on it.
    ///
    /// The removal is committed before the finalizer runs: a finalizer error
    /// propagates, but the entry is gone either way.
    fn evict(&self, inner: &mut Inner<K, V>, id: EntryId) -> Result<(), CacheError> {
        let Some(entry) = inner.entries.remove(id) else {
            return Ok(());
        };
        inner.index.remove(&entry.key);
        if let EntryState::Ready(value) = entry.state {
            self.counters.inc_eviction();
            if let Some(finalizer) = &self.finalizer {
                finalizer(&entry.key, &value)?;
            }
        }
        Ok(())
    }
}

impl<K, V> LoadingCache<K, V> {
    /// Drops one pin. The entry cannot have been removed while pinned, so
    /// the id is still live.
    fn unpin(&self, id: EntryId) {
        self.inner.lock().entries.unpin(id);
    }
}

impl<K, V> fmt::Debug for LoadingCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("LoadingCache")
            .field("len", &inner.entries.resident_len())
            .field("used_weight", &inner.entries.resident_weight())
            .field("capacity", &self.scavenger.capacity())
            .finish_non_exhaustive()
    }
}

impl<K, V> Drop for LoadingCache<K, V> {
    fn drop(&mut self) {
        let inner = self.inner.get_mut();
        // Finalize remaining entries oldest first, matching eviction order.
        // There is no caller to surface a finalizer error to here.
        while let Some(id) = inner.entries.lru() {
            let Some(entry) = inner.entries.remove(id) else {
                break;
            };
            if let EntryState::Ready(value) = entry.state {
                if let Some(finalizer) = &self.finalizer {
                    let _ = finalizer(&entry.key, &value);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::builder::CacheBuilder;

    type Recorder = Arc<Mutex<Vec<i64>>>;

    fn new_recorder() -> Recorder {
        Arc::new(Mutex::new(Vec::new()))
    }

    fn recorded(seq: &Recorder) -> Vec<i64> {
        seq.lock().unwrap().clone()
    }

    /// Identity-loader builder shared by most tests.
    fn identity_builder() -> CacheBuilder<i64, i64> {
        CacheBuilder::new().with_loader(|key: &i64| Ok(*key))
    }

    fn recording_builder(seq: &Recorder) -> CacheBuilder<i64, i64> {
        let seq = Arc::clone(seq);
        identity_builder().with_finalizer(move |key, _value| {
            seq.lock().unwrap().push(*key);
            Ok(())
        })
    }

    mod loading {
        use super::*;

        #[test]
        fn loads_and_returns_values_within_capacity() {
            let seq = new_recorder();
            let cache = recording_builder(&seq).with_capacity(10).build();

            for i in 0..10 {
                let got = cache.do_with(i, |v| Ok(*v)).unwrap();
                assert_eq!(got, i);
            }
            assert_eq!(cache.len(), 10);
            assert!(recorded(&seq).is_empty());
        }

        #[test]
        fn loader_runs_once_per_admission() {
            let calls = Arc::new(AtomicUsize::new(0));
            let counting = Arc::clone(&calls);
            let cache = CacheBuilder::new()
                .with_loader(move |key: &i64| {
                    counting.fetch_add(1, Ordering::SeqCst);
                    Ok(*key)
                })
                .with_capacity(4)
                .build();

            for _ in 0..5 {
                cache.do_with(1, |_| Ok(())).unwrap();
            }
            assert_eq!(calls.load(Ordering::SeqCst), 1);

            // Evicting the entry starts a fresh admission episode.
            for key in 2..6 {
                cache.do_with(key, |_| Ok(())).unwrap();
            }
            assert!(!cache.contains(&1));
            cache.do_with(1, |_| Ok(())).unwrap();
            assert_eq!(calls.load(Ordering::SeqCst), 6);
        }

        #[test]
        fn loader_rejects_key_with_no_such_item() {
            let cache = CacheBuilder::new()
                .with_loader(|key: &i64| {
                    if *key < 0 {
                        Err(CacheError::NoSuchItem)
                    } else {
                        Ok(*key)
                    }
                })
                .build();

            assert!(cache.do_with(0, |_| Ok(())).is_ok());
            assert_eq!(
                cache.do_with(-1, |_| Ok(())),
                Err(CacheError::NoSuchItem)
            );
            assert!(!cache.contains(&-1));
            assert_eq!(cache.len(), 1);
        }

        #[test]
        fn loader_error_is_surfaced_verbatim_and_nothing_is_inserted() {
            let the_err = CacheError::other(std::io::Error::other("backend down"));
            let loader_err = the_err.clone();
            let cache = CacheBuilder::new()
                .with_loader(move |_key: &i64| Err::<i64, _>(loader_err.clone()))
                .with_capacity(4)
                .build();

            let got = cache.do_with(7, |_| Ok(())).unwrap_err();
            assert_eq!(got, the_err);
            assert!(cache.is_empty());
            assert_eq!(cache.metrics().load_failures, 1);
        }
    }

    mod eviction {
        use super::*;

        #[test]
        fn wraparound_finalizes_oldest_first() {
            let seq = new_recorder();
            let cache = recording_builder(&seq).with_capacity(10).build();

            for i in 0..20 {
                let got = cache.do_with(i, |v| Ok(*v)).unwrap();
                assert_eq!(got, i);
            }
            assert_eq!(recorded(&seq), (0..10).collect::<Vec<_>>());

            // Hitting the resident half again must not swap anything out.
            for i in 10..20 {
                cache.do_with(i, |v| Ok(*v)).unwrap();
            }
            assert_eq!(recorded(&seq), (0..10).collect::<Vec<_>>());
        }

        #[test]
        fn hit_refreshes_recency_order() {
            let seq = new_recorder();
            let cache = recording_builder(&seq).with_capacity(3).build();

            for i in 0..3 {
                cache.do_with(i, |_| Ok(())).unwrap();
            }
            // Key 0 becomes MRU, so key 1 is now the LRU candidate.
            cache.do_with(0, |_| Ok(())).unwrap();
            cache.do_with(3, |_| Ok(())).unwrap();

            assert_eq!(recorded(&seq), vec![1]);
            assert!(cache.contains(&0));
            assert!(!cache.contains(&1));
        }

        #[test]
        fn finalizer_error_surfaces_but_eviction_commits() {
            let the_err = CacheError::other(std::io::Error::other("flush failed"));
            let finalizer_err = the_err.clone();
            let cache = CacheBuilder::new()
                .with_loader(|key: &i64| Ok(*key))
                .with_capacity(1)
                .with_finalizer(move |key, _value| {
                    if *key == 0 {
                        Err(finalizer_err.clone())
                    } else {
                        Ok(())
                    }
                })
                .build();

            cache.do_with(0, |_| Ok(())).unwrap();

            // Scavenging key 0 fails in the finalizer: the victim is gone,
            // the candidate is not inserted, the error reaches this caller.
            let got = cache.do_with(1, |_| Ok(())).unwrap_err();
            assert_eq!(got, the_err);
            assert!(!cache.contains(&0));
            assert!(!cache.contains(&1));
            assert!(cache.is_empty());

            // With the poisoned victim gone, the next attempt succeeds.
            cache.do_with(1, |_| Ok(())).unwrap();
            assert!(cache.contains(&1));
        }

        #[test]
        fn unbounded_cache_never_evicts() {
            let seq = new_recorder();
            let cache = recording_builder(&seq).build();

            for i in 0..100 {
                cache.do_with(i, |_| Ok(())).unwrap();
            }
            assert_eq!(cache.len(), 100);
            assert_eq!(cache.capacity(), None);
            assert!(recorded(&seq).is_empty());
        }
    }

    mod weights {
        use super::*;

        #[test]
        fn lazy_weight_scavenges_until_candidate_fits() {
            let seq = new_recorder();
            let seq_fin = Arc::clone(&seq);
            let cache = CacheBuilder::new()
                .with_loader(|key: &i64| Ok(*key))
                .with_lazy_scavenger(|key| *key as u64, 20)
                .with_finalizer(move |key, _value| {
                    seq_fin.lock().unwrap().push(*key);
                    Ok(())
                })
                .build();

            for i in 0..20 {
                let got = cache.do_with(i, |v| Ok(*v)).unwrap();
                assert_eq!(got, i);
            }
            assert_eq!(recorded(&seq), (0..19).collect::<Vec<_>>());
            assert_eq!(cache.used_weight(), 19);
            assert!(cache.contains(&19));
        }

        #[test]
        fn oversized_candidate_fails_without_evicting() {
            let seq = new_recorder();
            let seq_fin = Arc::clone(&seq);
            let cache = CacheBuilder::new()
                .with_loader(|key: &i64| Ok(*key))
                .with_lazy_scavenger(|key| *key as u64, 20)
                .with_finalizer(move |key, _value| {
                    seq_fin.lock().unwrap().push(*key);
                    Ok(())
                })
                .build();

            for i in 0..20 {
                cache.do_with(i, |_| Ok(())).unwrap();
            }
            let before = recorded(&seq);

            assert_eq!(
                cache.do_with(100, |_| Ok(())),
                Err(CacheError::NotEnoughSpace)
            );
            // The failed admission evicted nothing.
            assert_eq!(recorded(&seq), before);
            assert!(cache.contains(&19));
        }

        #[test]
        fn used_weight_tracks_resident_sum() {
            let cache = CacheBuilder::new()
                .with_loader(|key: &i64| Ok(*key))
                .with_lazy_scavenger(|key| *key as u64, 100)
                .build();

            for i in [10, 20, 30] {
                cache.do_with(i, |_| Ok(())).unwrap();
            }
            assert_eq!(cache.used_weight(), 60);
            assert_eq!(cache.capacity(), Some(100));

            // 60 + 70 > 100: scavenges 10 and 20, keeps 30.
            cache.do_with(70, |_| Ok(())).unwrap();
            assert_eq!(cache.used_weight(), 100);
            assert!(cache.contains(&30));
            assert!(!cache.contains(&10));
            assert!(!cache.contains(&20));
        }

        #[test]
        fn count_mode_weighs_entries_as_one() {
            let cache = identity_builder().with_capacity(5).build();
            for i in 0..3 {
                cache.do_with(i, |_| Ok(())).unwrap();
            }
            assert_eq!(cache.used_weight(), 3);
            assert_eq!(cache.len(), 3);
        }
    }

    mod errors {
        use super::*;

        #[test]
        fn callback_error_passes_through_verbatim() {
            let cache = identity_builder().with_capacity(4).build();
            let the_err = CacheError::other(std::io::Error::other("user says no"));
            let cb_err = the_err.clone();

            let got = cache.do_with(1, move |_| Err::<(), _>(cb_err)).unwrap_err();
            assert_eq!(got, the_err);
            // A failing callback still counts as use: the entry stays.
            assert!(cache.contains(&1));
        }

        #[test]
        fn pinned_entry_blocks_admission_until_released() {
            let cache = identity_builder().with_capacity(1).build();

            cache
                .do_with(1000, |_| {
                    // The sole resident entry is pinned by this callback, so
                    // another key cannot be admitted right now.
                    assert_eq!(
                        cache.do_with(1001, |_| Ok(())),
                        Err(CacheError::NotEnoughSpace)
                    );
                    // Introspection does not deadlock inside a callback.
                    assert_eq!(cache.len(), 1);
                    Ok(())
                })
                .unwrap();

            // Pin released: the old entry is evictable again.
            cache.do_with(1001, |_| Ok(())).unwrap();
            assert!(cache.contains(&1001));
            assert!(!cache.contains(&1000));
        }

        #[test]
        fn pinned_entry_survives_failed_admissions() {
            let seq = new_recorder();
            let cache = recording_builder(&seq).with_capacity(1).build();

            cache
                .do_with(7, |v| {
                    for other in 8..12 {
                        assert_eq!(
                            cache.do_with(other, |_| Ok(())),
                            Err(CacheError::NotEnoughSpace)
                        );
                    }
                    assert_eq!(*v, 7);
                    Ok(())
                })
                .unwrap();

            assert!(recorded(&seq).is_empty());
            assert!(cache.contains(&7));
        }
    }

    mod maintenance {
        use super::*;

        #[test]
        fn purge_finalizes_everything_oldest_first() {
            let seq = new_recorder();
            let cache = recording_builder(&seq).with_capacity(10).build();

            for i in 0..5 {
                cache.do_with(i, |_| Ok(())).unwrap();
            }
            cache.purge().unwrap();

            assert_eq!(recorded(&seq), (0..5).collect::<Vec<_>>());
            assert!(cache.is_empty());
            assert_eq!(cache.used_weight(), 0);

            // Purged keys load fresh afterwards.
            cache.do_with(0, |_| Ok(())).unwrap();
            assert_eq!(cache.len(), 1);
        }

        #[test]
        fn drop_finalizes_residents() {
            let seq = new_recorder();
            {
                let cache = recording_builder(&seq).with_capacity(10).build();
                for i in 0..4 {
                    cache.do_with(i, |_| Ok(())).unwrap();
                }
            }
            assert_eq!(recorded(&seq), (0..4).collect::<Vec<_>>());
        }

        #[test]
        fn metrics_reflect_traffic() {
            let cache = identity_builder().with_capacity(10).build();

            for i in 0..20 {
                cache.do_with(i, |_| Ok(())).unwrap();
            }
            for i in 10..20 {
                cache.do_with(i, |_| Ok(())).unwrap();
            }

            let snap = cache.metrics();
            assert_eq!(snap.misses, 20);
            assert_eq!(snap.loads, 20);
            assert_eq!(snap.hits, 10);
            assert_eq!(snap.evictions, 10);
            assert_eq!(snap.load_failures, 0);
        }

        #[test]
        fn debug_output_shows_occupancy() {
            let cache = identity_builder().with_capacity(4).build();
            cache.do_with(1, |_| Ok(())).unwrap();
            let rendered = format!("{:?}", cache);
            assert!(rendered.contains("LoadingCache"));
            assert!(rendered.contains("len: 1"));
        }
    }
}

//! Admission policy: how much a candidate weighs and how much fits.
//!
//! The scavenger answers two questions during admission: what is the weight
//! of the entry about to be inserted, and what is the total weight budget.
//! Victim selection itself happens in the cache core, which walks the
//! recency list tail-first with this policy's numbers in hand.
//!
//! | Mode         | Weight per entry      | Capacity               |
//! |--------------|-----------------------|------------------------|
//! | `Unbounded`  | 1 (accounting only)   | none, every entry fits |
//! | `Count`      | 1                     | max resident entries   |
//! | `LazyWeight` | `weight_fn(key)`      | max total weight       |
//!
//! In lazy weight mode the weight function runs once per admission, after
//! the loader returns and before the cache mutex is reacquired; the result
//! is stored on the entry so eviction never recomputes it.

use std::fmt;

/// Caller-supplied weight function for lazy weight mode.
pub type WeightFn<K> = Box<dyn Fn(&K) -> u64 + Send + Sync>;

/// Admission policy selected at construction time.
pub enum Scavenger<K> {
    /// No capacity limit; admission always fits.
    Unbounded,
    /// Entry-count limit: every entry weighs 1.
    Count {
        /// Maximum number of resident entries.
        capacity: u64,
    },
    /// Total-weight limit with a per-key weight function.
    LazyWeight {
        /// Computes the weight of a key at admission time.
        weight_fn: WeightFn<K>,
        /// Maximum total weight of resident entries.
        capacity: u64,
    },
}

impl<K> Scavenger<K> {
    /// Returns the weight of `key` under this policy.
    pub fn weight(&self, key: &K) -> u64 {
        match self {
            Scavenger::Unbounded | Scavenger::Count { .. } => 1,
            Scavenger::LazyWeight { weight_fn, .. } => weight_fn(key),
        }
    }

    /// Returns the total weight budget, or `None` when unbounded.
    pub fn capacity(&self) -> Option<u64> {
        match self {
            Scavenger::Unbounded => None,
            Scavenger::Count { capacity } | Scavenger::LazyWeight { capacity, .. } => {
                Some(*capacity)
            },
        }
    }
}

impl<K> fmt::Debug for Scavenger<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scavenger::Unbounded => f.write_str("Unbounded"),
            Scavenger::Count { capacity } => {
                f.debug_struct("Count").field("capacity", capacity).finish()
            },
            Scavenger::LazyWeight { capacity, .. } => f
                .debug_struct("LazyWeight")
                .field("capacity", capacity)
                .finish_non_exhaustive(),
        }
    }
}

//! Builder for [`LoadingCache`] instances.
//!
//! Collects the loader, the optional finalizer, and the admission policy,
//! then validates the combination. Count mode and lazy weight mode are
//! mutually exclusive; whichever option is applied later wins.
//!
//! ## Example
//!
//! ```rust
//! use loadcache::builder::CacheBuilder;
//!
//! let cache = CacheBuilder::new()
//!     .with_loader(|key: &u64| Ok(key.to_string()))
//!     .with_capacity(100)
//!     .build();
//!
//! let first_char = cache.do_with(42, |v| Ok(v.chars().next())).unwrap();
//! assert_eq!(first_char, Some('4'));
//! ```

use std::hash::Hash;

use crate::cache::{Finalizer, Loader, LoadingCache};
use crate::error::{CacheError, ConfigError};
use crate::scavenger::Scavenger;

/// Builder collecting the options of a [`LoadingCache`].
///
/// A loader is required; everything else has a default: no finalizer, and an
/// unbounded cache when neither [`with_capacity`](Self::with_capacity) nor
/// [`with_lazy_scavenger`](Self::with_lazy_scavenger) is applied.
pub struct CacheBuilder<K, V> {
    loader: Option<Loader<K, V>>,
    finalizer: Option<Finalizer<K, V>>,
    scavenger: Scavenger<K>,
}

impl<K, V> CacheBuilder<K, V> {
    /// Creates a builder with no loader, no finalizer, and no capacity
    /// limit.
    pub fn new() -> Self {
        CacheBuilder {
            loader: None,
            finalizer: None,
            scavenger: Scavenger::Unbounded,
        }
    }

    /// Sets the loader invoked on cache misses. Required.
    ///
    /// Return [`CacheError::NoSuchItem`](crate::error::CacheError::NoSuchItem)
    /// to mark a key as absent; any other error is surfaced verbatim to the
    /// caller that triggered the load.
    pub fn with_loader(
        mut self,
        loader: impl Fn(&K) -> Result<V, CacheError> + Send + Sync + 'static,
    ) -> Self {
        self.loader = Some(Box::new(loader));
        self
    }

    /// Bounds the cache to `capacity` resident entries (count mode).
    ///
    /// Overrides any previously configured lazy scavenger.
    pub fn with_capacity(mut self, capacity: u64) -> Self {
        self.scavenger = Scavenger::Count { capacity };
        self
    }

    /// Bounds the cache to `capacity` total weight, with `weight_fn`
    /// computing each key's weight at admission time (lazy weight mode).
    ///
    /// Overrides any previously configured count capacity.
    pub fn with_lazy_scavenger(
        mut self,
        weight_fn: impl Fn(&K) -> u64 + Send + Sync + 'static,
        capacity: u64,
    ) -> Self {
        self.scavenger = Scavenger::LazyWeight {
            weight_fn: Box::new(weight_fn),
            capacity,
        };
        self
    }

    /// Sets the finalizer invoked once per entry that leaves the cache.
    pub fn with_finalizer(
        mut self,
        finalizer: impl Fn(&K, &V) -> Result<(), CacheError> + Send + Sync + 'static,
    ) -> Self {
        self.finalizer = Some(Box::new(finalizer));
        self
    }
}

impl<K, V> CacheBuilder<K, V>
where
    K: Eq + Hash + Clone,
{
    /// Builds the cache, validating the configuration.
    ///
    /// Fails when no loader was set or when a configured capacity is zero.
    pub fn try_build(self) -> Result<LoadingCache<K, V>, ConfigError> {
        let Some(loader) = self.loader else {
            return Err(ConfigError::new("a loader is required"));
        };
        if self.scavenger.capacity() == Some(0) {
            return Err(ConfigError::new("capacity must be > 0"));
        }
        Ok(LoadingCache::new(loader, self.finalizer, self.scavenger))
    }

    /// Builds the cache.
    ///
    /// # Panics
    ///
    /// Panics on an invalid configuration; see [`try_build`](Self::try_build)
    /// for the fallible variant.
    pub fn build(self) -> LoadingCache<K, V> {
        match self.try_build() {
            Ok(cache) => cache,
            Err(err) => panic!("invalid cache configuration: {}", err),
        }
    }
}

impl<K, V> Default for CacheBuilder<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

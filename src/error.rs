//! Error types for the loadcache library.
//!
//! ## Key Components
//!
//! - [`CacheError`]: Returned by [`do_with`](crate::cache::LoadingCache::do_with)
//!   and propagated through loaders, finalizers, and access callbacks. The
//!   `NoSuchItem` and `NotEnoughSpace` sentinels are observable by equality;
//!   everything else travels in [`CacheError::Other`] and compares by
//!   identity, so an error handed to the cache comes back as the same value.
//! - [`ConfigError`]: Returned by [`CacheBuilder::try_build`](crate::builder::CacheBuilder::try_build)
//!   when the builder configuration is invalid (missing loader, zero
//!   capacity).
//!
//! ## Example Usage
//!
//! ```
//! use loadcache::builder::CacheBuilder;
//! use loadcache::error::CacheError;
//!
//! let cache = CacheBuilder::new()
//!     .with_loader(|key: &i64| {
//!         if *key < 0 {
//!             Err(CacheError::NoSuchItem)
//!         } else {
//!             Ok(*key)
//!         }
//!     })
//!     .build();
//!
//! assert_eq!(cache.do_with(-1, |_| Ok(())), Err(CacheError::NoSuchItem));
//! assert!(cache.do_with(1, |_| Ok(())).is_ok());
//! ```

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

// ---------------------------------------------------------------------------
// CacheError
// ---------------------------------------------------------------------------

/// Error produced by cache operations or passed through from user callbacks.
///
/// Loaders signal an absent key with [`CacheError::NoSuchItem`]; admission
/// signals an unsatisfiable weight with [`CacheError::NotEnoughSpace`]. Any
/// other failure from a loader, finalizer, or access callback is wrapped via
/// [`CacheError::other`] and surfaced verbatim: cloning keeps the same inner
/// allocation, and two `Other` values compare equal only when they share it.
#[derive(Debug, Clone)]
pub enum CacheError {
    /// The loader reported that no value exists for the requested key.
    NoSuchItem,
    /// Admission could not fit the candidate even after evicting every
    /// unpinned entry.
    NotEnoughSpace,
    /// An error propagated from a loader, finalizer, or access callback.
    Other(Arc<dyn StdError + Send + Sync>),
}

impl CacheError {
    /// Wraps an arbitrary error for verbatim propagation through the cache.
    ///
    /// # Example
    ///
    /// ```
    /// use loadcache::error::CacheError;
    ///
    /// let err = CacheError::other(std::io::Error::other("backend down"));
    /// let same = err.clone();
    /// assert_eq!(err, same);
    /// assert_ne!(err, CacheError::other(std::io::Error::other("backend down")));
    /// ```
    pub fn other(err: impl StdError + Send + Sync + 'static) -> Self {
        CacheError::Other(Arc::new(err))
    }
}

impl PartialEq for CacheError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (CacheError::NoSuchItem, CacheError::NoSuchItem) => true,
            (CacheError::NotEnoughSpace, CacheError::NotEnoughSpace) => true,
            // Identity, not message comparison: a cloned error is "the same
            // error", two independently constructed ones are not.
            (CacheError::Other(a), CacheError::Other(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheError::NoSuchItem => f.write_str("no such item"),
            CacheError::NotEnoughSpace => f.write_str("not enough space in cache"),
            CacheError::Other(err) => err.fmt(f),
        }
    }
}

impl StdError for CacheError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            CacheError::Other(err) => {
                let err: &(dyn StdError + 'static) = err.as_ref();
                Some(err)
            },
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Error returned when builder configuration parameters are invalid.
///
/// Produced by [`CacheBuilder::try_build`](crate::builder::CacheBuilder::try_build).
/// Carries a human-readable description of which parameter failed validation.
///
/// # Example
///
/// ```
/// use loadcache::builder::CacheBuilder;
///
/// let err = CacheBuilder::<u64, u64>::new().try_build().unwrap_err();
/// assert!(err.to_string().contains("loader"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError(String);

impl ConfigError {
    /// Creates a new `ConfigError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl StdError for ConfigError {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

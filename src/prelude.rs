pub use crate::builder::CacheBuilder;
pub use crate::cache::{Finalizer, Loader, LoadingCache};
pub use crate::ds::{EntryId, ResidencyTable};
pub use crate::error::{CacheError, ConfigError};
pub use crate::metrics::CacheMetrics;
pub use crate::scavenger::{Scavenger, WeightFn};

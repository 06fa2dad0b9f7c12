//! loadcache: bounded concurrent loading cache with pin-on-use access.
//!
//! See `DESIGN.md` for internal architecture and invariants.

pub mod ds;

pub mod builder;
pub mod cache;
pub mod error;
pub mod metrics;
pub mod prelude;
pub mod scavenger;

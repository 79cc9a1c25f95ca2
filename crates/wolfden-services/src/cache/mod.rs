//! Cache store implementations
//!
//! The [`CacheStore`] port is defined in `wolfden-domain`; this module
//! carries the in-memory implementation used in production and the
//! null implementation used when caching is disabled or under test.

mod memory;
mod null;

pub use memory::MemoryCacheStore;
pub use null::NullCacheStore;

pub use wolfden_domain::ports::{CacheStats, CacheStore};

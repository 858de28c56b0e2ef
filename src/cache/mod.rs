//! Cache Module
//!
//! Provides in-memory caching with byte/entry caps, FIFO eviction and lazy
//! TTL expiration, plus size estimation for cached values.

mod entry;
mod guard;
mod key;
mod order;
mod stats;
mod store;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use guard::SizeGuard;
pub use key::CacheKey;
pub use stats::CacheStats;
pub use store::{CacheLimits, CacheStore, PutOutcome, SkipReason};

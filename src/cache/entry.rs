//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with insertion-time TTL.

use chrono::Utc;

// == Cache Entry ==
/// A cached value with its insertion time and estimated size.
///
/// Entries never leave the `CacheStore`; callers only ever see clones of
/// `value`.
#[derive(Debug, Clone)]
pub(crate) struct CacheEntry<V> {
    /// The stored value
    pub value: V,
    /// Insertion timestamp (Unix milliseconds). Reads never refresh it.
    pub inserted_at: u64,
    /// Estimated serialized size of `value`
    pub size_bytes: usize,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates a new entry stamped with the current time.
    pub fn new(value: V, size_bytes: usize) -> Self {
        Self {
            value,
            inserted_at: current_timestamp_ms(),
            size_bytes,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has outlived `ttl_ms` at time `now`.
    ///
    /// An entry is expired only once its age is strictly greater than the
    /// TTL; an entry exactly `ttl_ms` old is still served.
    pub fn is_expired_at(&self, ttl_ms: u64, now: u64) -> bool {
        now.saturating_sub(self.inserted_at) > ttl_ms
    }

    /// Checks expiry against the current clock.
    pub fn is_expired(&self, ttl_ms: u64) -> bool {
        self.is_expired_at(ttl_ms, current_timestamp_ms())
    }

    // == Age ==
    /// Milliseconds since insertion.
    pub fn age_ms(&self) -> u64 {
        current_timestamp_ms().saturating_sub(self.inserted_at)
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub(crate) fn current_timestamp_ms() -> u64 {
    Utc::now().timestamp_millis().max(0) as u64
}

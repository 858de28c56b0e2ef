//! Cache Statistics Module
//!
//! Tracks occupancy and hit/miss/eviction counters.

use serde::Serialize;

// == Cache Stats ==
/// Snapshot of cache occupancy and counters.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    /// Current number of entries in the cache
    pub entry_count: usize,
    /// Combined estimated size of all cached values
    pub total_bytes: usize,
    /// Configured byte capacity
    pub max_bytes: usize,
    /// Number of reads served from the cache
    pub hits: u64,
    /// Number of reads that found nothing usable
    pub misses: u64,
    /// Number of entries removed to satisfy a capacity limit
    pub evictions: u64,
    /// Number of entries dropped by lazy TTL expiry
    pub expirations: u64,
    /// Number of puts declined (oversized or unmeasurable)
    pub skipped: u64,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new(max_bytes: usize) -> Self {
        Self {
            max_bytes,
            ..Self::default()
        }
    }

    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no reads have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub(crate) fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub(crate) fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub(crate) fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    pub(crate) fn record_expiration(&mut self) {
        self.expirations += 1;
    }

    pub(crate) fn record_skip(&mut self) {
        self.skipped += 1;
    }

    // == Update Occupancy ==
    pub(crate) fn set_occupancy(&mut self, entry_count: usize, total_bytes: usize) {
        self.entry_count = entry_count;
        self.total_bytes = total_bytes;
    }
}

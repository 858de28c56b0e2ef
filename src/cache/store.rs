//! Cache Store Module
//!
//! Main cache engine combining HashMap storage with insertion-order eviction,
//! byte and entry caps, and lazy TTL expiration.

use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::cache::entry::CacheEntry;
use crate::cache::order::InsertionOrder;
use crate::cache::{CacheKey, CacheStats, SizeGuard};
use crate::config::Config;

// == Cache Limits ==
/// Capacity and freshness bounds of a `CacheStore`.
#[derive(Debug, Clone, Copy)]
pub struct CacheLimits {
    pub max_entries: usize,
    pub max_total_bytes: usize,
    pub single_item_byte_limit: usize,
    pub ttl_seconds: u64,
}

impl CacheLimits {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_entries: config.max_entries,
            max_total_bytes: config.max_total_bytes,
            single_item_byte_limit: config.single_item_byte_limit,
            ttl_seconds: config.ttl_seconds,
        }
    }

    fn ttl_ms(&self) -> u64 {
        self.ttl_seconds.saturating_mul(1000)
    }
}

impl Default for CacheLimits {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

// == Put Outcome ==
/// Result of a `put`. Skips are informational, never errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutOutcome {
    /// Value cached; `evicted` older entries made room for it
    Stored { size_bytes: usize, evicted: usize },
    /// Value not cached
    Skipped(SkipReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Estimated size exceeds the single-item limit or the total capacity
    Oversized { size_bytes: usize },
    /// The value could not be serialized for size estimation
    EstimationFailed,
    /// The store is configured to hold no entries
    ZeroCapacity,
}

// == Cache Store ==
/// Bounded key/value cache with FIFO eviction and TTL expiry.
///
/// Eviction removes the entry with the oldest insertion time. `get` never
/// refreshes an entry, so eviction order is pure insertion order.
#[derive(Debug)]
pub struct CacheStore<V> {
    /// Key-value storage
    entries: HashMap<CacheKey, CacheEntry<V>>,
    /// Eviction order
    order: InsertionOrder,
    /// Counters and occupancy
    stats: CacheStats,
    /// Size estimation and warnings
    guard: SizeGuard,
    limits: CacheLimits,
    /// Sum of `size_bytes` over all entries
    total_bytes: usize,
}

impl<V: Serialize + Clone> CacheStore<V> {
    // == Constructor ==
    /// Creates a new CacheStore with the given limits and size guard.
    pub fn new(limits: CacheLimits, guard: SizeGuard) -> Self {
        Self {
            entries: HashMap::new(),
            order: InsertionOrder::new(),
            stats: CacheStats::new(limits.max_total_bytes),
            guard,
            limits,
            total_bytes: 0,
        }
    }

    /// Creates a CacheStore from the layer configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            CacheLimits::from_config(config),
            SizeGuard::new(config.size_warn_threshold_bytes),
        )
    }

    // == Put ==
    /// Stores a value under `key`.
    ///
    /// Values too large to cache are skipped and logged. Otherwise the oldest
    /// inserted entries are evicted until both caps hold with the new value in
    /// place. Overwriting a key gives it a fresh insertion time.
    pub fn put(&mut self, key: impl Into<CacheKey>, value: V) -> PutOutcome {
        let key = key.into();

        let size_bytes = match self.guard.estimate(&value) {
            Ok(size) => size,
            Err(err) => {
                warn!(key = %key, error = %err, "Size estimation failed, not caching");
                self.stats.record_skip();
                return PutOutcome::Skipped(SkipReason::EstimationFailed);
            }
        };
        self.guard.check_and_warn(size_bytes, key.as_str());

        if self.limits.max_entries == 0 {
            self.stats.record_skip();
            return PutOutcome::Skipped(SkipReason::ZeroCapacity);
        }

        if size_bytes > self.limits.single_item_byte_limit
            || size_bytes > self.limits.max_total_bytes
        {
            info!(
                key = %key,
                size_bytes,
                limit = self.limits.single_item_byte_limit,
                "Value too large to cache, skipping"
            );
            self.stats.record_skip();
            return PutOutcome::Skipped(SkipReason::Oversized { size_bytes });
        }

        // Overwrite case: the old value no longer counts against the caps
        self.remove_entry(&key);

        let mut evicted = 0;
        while self.entries.len() + 1 > self.limits.max_entries
            || self.total_bytes + size_bytes > self.limits.max_total_bytes
        {
            let Some(oldest) = self.order.evict_oldest() else {
                break;
            };
            if let Some(entry) = self.entries.remove(&oldest) {
                self.total_bytes -= entry.size_bytes;
                debug!(key = %oldest, size_bytes = entry.size_bytes, "Evicted cache entry");
            }
            self.stats.record_eviction();
            evicted += 1;
        }

        self.entries
            .insert(key.clone(), CacheEntry::new(value, size_bytes));
        self.order.record(&key);
        self.total_bytes += size_bytes;
        self.sync_occupancy();

        PutOutcome::Stored {
            size_bytes,
            evicted,
        }
    }

    // == Get ==
    /// Retrieves a value by key.
    ///
    /// Entries older than the TTL are removed and reported as absent.
    pub fn get(&mut self, key: &CacheKey) -> Option<V> {
        let ttl_ms = self.limits.ttl_ms();
        let expired = match self.entries.get(key) {
            None => {
                self.stats.record_miss();
                return None;
            }
            Some(entry) => entry.is_expired(ttl_ms),
        };

        if expired {
            if let Some(entry) = self.remove_entry(key) {
                debug!(key = %key, age_ms = entry.age_ms(), "Cache entry expired");
            }
            self.stats.record_expiration();
            self.stats.record_miss();
            return None;
        }

        self.stats.record_hit();
        self.entries.get(key).map(|entry| entry.value.clone())
    }
}

impl<V> CacheStore<V> {
    // == Invalidate ==
    /// Removes a single entry. Returns true if it existed.
    pub fn invalidate(&mut self, key: &CacheKey) -> bool {
        self.remove_entry(key).is_some()
    }

    // == Clear ==
    /// Removes every entry. Returns the number removed.
    pub fn clear(&mut self) -> usize {
        let count = self.entries.len();
        self.entries.clear();
        self.order.clear();
        self.total_bytes = 0;
        self.sync_occupancy();
        info!(count, "Cache cleared");
        count
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_occupancy(self.entries.len(), self.total_bytes);
        stats
    }

    pub fn limits(&self) -> CacheLimits {
        self.limits
    }

    // == Length ==
    /// Returns the current number of entries in the cache.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total_bytes(&self) -> usize {
        self.total_bytes
    }

    fn remove_entry(&mut self, key: &CacheKey) -> Option<CacheEntry<V>> {
        let entry = self.entries.remove(key)?;
        self.order.remove(key);
        self.total_bytes -= entry.size_bytes;
        self.sync_occupancy();
        Some(entry)
    }

    fn sync_occupancy(&mut self) {
        debug_assert_eq!(self.entries.len(), self.order.len());
        self.stats
            .set_occupancy(self.entries.len(), self.total_bytes);
    }
}

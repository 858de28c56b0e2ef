//! Configuration Module
//!
//! Handles loading and managing layer configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Data-access layer configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum number of entries the cache can hold
    pub max_entries: usize,
    /// Maximum combined estimated size of all cached values
    pub max_total_bytes: usize,
    /// Values estimated above this size are never cached
    pub single_item_byte_limit: usize,
    /// Age in seconds after which a cached entry reads as absent
    pub ttl_seconds: u64,
    /// Upper bound for a requested page size
    pub hard_cap_page_size: usize,
    /// Upper bound for a requested query result limit
    pub hard_cap_query_limit: usize,
    /// Operations allowed in one store transaction
    pub server_max_ops: usize,
    /// Serialized sizes above this emit a warning
    pub size_warn_threshold_bytes: usize,
    /// Page size used when the caller does not pass one
    pub default_page_size: usize,
    /// Query limit used when the caller does not pass one
    pub default_query_limit: usize,
    /// Timeout for each external store call in milliseconds, 0 = none
    pub store_timeout_ms: u64,
    /// Cache "document not found" results until TTL expiry
    pub cache_negative_lookups: bool,
    /// HTTP server port for the inspection API
    pub server_port: u16,
    /// Collection holding one profile document per identity
    pub preload_profile_collection: String,
    /// Collections whose first page is warmed per identity
    pub preload_owned_collections: Vec<String>,
    /// Field linking owned documents to an identity
    pub preload_owner_field: String,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `MAX_ENTRIES` (default: 100)
    /// - `MAX_TOTAL_BYTES` (default: 10_000_000)
    /// - `SINGLE_ITEM_BYTE_LIMIT` (default: 1_000_000)
    /// - `TTL_SECONDS` (default: 300)
    /// - `HARD_CAP_PAGE_SIZE` (default: 50)
    /// - `HARD_CAP_QUERY_LIMIT` (default: 1000)
    /// - `SERVER_MAX_OPS` (default: 500)
    /// - `SIZE_WARN_THRESHOLD_BYTES` (default: 1_000_000)
    /// - `DEFAULT_PAGE_SIZE` (default: 20)
    /// - `DEFAULT_QUERY_LIMIT` (default: 100)
    /// - `STORE_TIMEOUT_MS` (default: 0, disabled)
    /// - `CACHE_NEGATIVE_LOOKUPS` (default: false)
    /// - `SERVER_PORT` (default: 3000)
    /// - `PRELOAD_PROFILE_COLLECTION` (default: "users")
    /// - `PRELOAD_OWNED_COLLECTIONS` comma separated (default: "progress")
    /// - `PRELOAD_OWNER_FIELD` (default: "userId")
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_entries: env_or("MAX_ENTRIES", defaults.max_entries),
            max_total_bytes: env_or("MAX_TOTAL_BYTES", defaults.max_total_bytes),
            single_item_byte_limit: env_or(
                "SINGLE_ITEM_BYTE_LIMIT",
                defaults.single_item_byte_limit,
            ),
            ttl_seconds: env_or("TTL_SECONDS", defaults.ttl_seconds),
            hard_cap_page_size: env_or("HARD_CAP_PAGE_SIZE", defaults.hard_cap_page_size),
            hard_cap_query_limit: env_or("HARD_CAP_QUERY_LIMIT", defaults.hard_cap_query_limit),
            server_max_ops: env_or("SERVER_MAX_OPS", defaults.server_max_ops),
            size_warn_threshold_bytes: env_or(
                "SIZE_WARN_THRESHOLD_BYTES",
                defaults.size_warn_threshold_bytes,
            ),
            default_page_size: env_or("DEFAULT_PAGE_SIZE", defaults.default_page_size),
            default_query_limit: env_or("DEFAULT_QUERY_LIMIT", defaults.default_query_limit),
            store_timeout_ms: env_or("STORE_TIMEOUT_MS", defaults.store_timeout_ms),
            cache_negative_lookups: env_or(
                "CACHE_NEGATIVE_LOOKUPS",
                defaults.cache_negative_lookups,
            ),
            server_port: env_or("SERVER_PORT", defaults.server_port),
            preload_profile_collection: env::var("PRELOAD_PROFILE_COLLECTION")
                .unwrap_or(defaults.preload_profile_collection),
            preload_owned_collections: env::var("PRELOAD_OWNED_COLLECTIONS")
                .map(|v| {
                    v.split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(String::from)
                        .collect()
                })
                .unwrap_or(defaults.preload_owned_collections),
            preload_owner_field: env::var("PRELOAD_OWNER_FIELD")
                .unwrap_or(defaults.preload_owner_field),
        }
    }

    /// Returns the per-call store timeout, if one is configured.
    pub fn store_timeout(&self) -> Option<Duration> {
        (self.store_timeout_ms > 0).then(|| Duration::from_millis(self.store_timeout_ms))
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_entries: 100,
            max_total_bytes: 10_000_000,
            single_item_byte_limit: 1_000_000,
            ttl_seconds: 300,
            hard_cap_page_size: 50,
            hard_cap_query_limit: 1000,
            server_max_ops: 500,
            size_warn_threshold_bytes: 1_000_000,
            default_page_size: 20,
            default_query_limit: 100,
            store_timeout_ms: 0,
            cache_negative_lookups: false,
            server_port: 3000,
            preload_profile_collection: "users".to_string(),
            preload_owned_collections: vec!["progress".to_string()],
            preload_owner_field: "userId".to_string(),
        }
    }
}

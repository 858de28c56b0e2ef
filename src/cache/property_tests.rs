//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check the capacity, ordering and freshness guarantees of
//! the cache, plus the pagination and batching layers built on it.

use proptest::prelude::*;
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;
use std::thread::sleep;
use std::time::Duration;

use crate::access::fixture;
use crate::batch::BatchWriter;
use crate::cache::{CacheKey, CacheLimits, CacheStore, PutOutcome, SizeGuard};
use crate::config::Config;
use crate::store::{BatchOperation, DocRef, Direction, Document, MemoryStore, QueryConstraints};

// == Test Configuration ==
const TEST_MAX_ENTRIES: usize = 100;
const TEST_MAX_BYTES: usize = 100_000;

fn limits(max_entries: usize, max_total_bytes: usize, ttl_seconds: u64) -> CacheLimits {
    CacheLimits {
        max_entries,
        max_total_bytes,
        single_item_byte_limit: max_total_bytes,
        ttl_seconds,
    }
}

fn store_with(limits: CacheLimits) -> CacheStore<String> {
    CacheStore::new(limits, SizeGuard::new(usize::MAX))
}

// == Strategies ==
/// Generates cache keys from a small alphabet so operations collide
fn key_strategy() -> impl Strategy<Value = String> {
    "[a-e][0-9]{0,2}".prop_map(|s| s)
}

fn value_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ]{0,64}".prop_map(|s| s)
}

#[derive(Debug, Clone)]
enum CacheOp {
    Put { key: String, value: String },
    Get { key: String },
    Invalidate { key: String },
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        3 => (key_strategy(), value_strategy())
            .prop_map(|(key, value)| CacheOp::Put { key, value }),
        2 => key_strategy().prop_map(|key| CacheOp::Get { key }),
        1 => key_strategy().prop_map(|key| CacheOp::Invalidate { key }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // Both caps hold after every operation, whatever the limits.
    #[test]
    fn prop_caps_always_hold(
        max_entries in 1usize..10,
        max_bytes in 16usize..400,
        ops in prop::collection::vec(cache_op_strategy(), 1..80),
    ) {
        let mut store = store_with(limits(max_entries, max_bytes, 300));

        for op in ops {
            match op {
                CacheOp::Put { key, value } => {
                    store.put(key.as_str(), value);
                }
                CacheOp::Get { key } => {
                    store.get(&CacheKey::from(key));
                }
                CacheOp::Invalidate { key } => {
                    store.invalidate(&CacheKey::from(key));
                }
            }
            prop_assert!(store.len() <= max_entries);
            prop_assert!(store.total_bytes() <= max_bytes);
            let stats = store.stats();
            prop_assert_eq!(stats.entry_count, store.len());
            prop_assert_eq!(stats.total_bytes, store.total_bytes());
        }
    }

    // Hits and misses reflect exactly the gets that found or missed a value.
    #[test]
    fn prop_statistics_accuracy(ops in prop::collection::vec(cache_op_strategy(), 1..50)) {
        let mut store = store_with(limits(TEST_MAX_ENTRIES, TEST_MAX_BYTES, 300));
        let mut expected_hits: u64 = 0;
        let mut expected_misses: u64 = 0;

        for op in ops {
            match op {
                CacheOp::Put { key, value } => {
                    store.put(key.as_str(), value);
                }
                CacheOp::Get { key } => match store.get(&CacheKey::from(key)) {
                    Some(_) => expected_hits += 1,
                    None => expected_misses += 1,
                },
                CacheOp::Invalidate { key } => {
                    store.invalidate(&CacheKey::from(key));
                }
            }
        }

        let stats = store.stats();
        prop_assert_eq!(stats.hits, expected_hits, "Hits mismatch");
        prop_assert_eq!(stats.misses, expected_misses, "Misses mismatch");
    }

    // A stored value reads back unchanged; an overwrite replaces it.
    #[test]
    fn prop_round_trip_and_overwrite(
        key in key_strategy(),
        first in value_strategy(),
        second in value_strategy(),
    ) {
        let mut store = store_with(limits(TEST_MAX_ENTRIES, TEST_MAX_BYTES, 300));
        let cache_key = CacheKey::from(key.as_str());

        store.put(key.as_str(), first.clone());
        prop_assert_eq!(store.get(&cache_key), Some(first));

        store.put(key.as_str(), second.clone());
        prop_assert_eq!(store.get(&cache_key), Some(second));
        prop_assert_eq!(store.len(), 1);
    }

    // Eviction follows insertion order only; reads never protect an entry.
    #[test]
    fn prop_fifo_eviction_ignores_reads(
        capacity in 1usize..8,
        extra in 1usize..8,
        reads in prop::collection::vec(0usize..16, 0..20),
    ) {
        let total = capacity + extra;
        let mut store = store_with(limits(capacity, TEST_MAX_BYTES, 300));

        for i in 0..total {
            store.put(format!("k{}", i), format!("v{}", i));
            for &r in &reads {
                if r <= i {
                    store.get(&CacheKey::from(format!("k{}", r)));
                }
            }
        }

        for i in 0..total {
            let present = store.get(&CacheKey::from(format!("k{}", i))).is_some();
            prop_assert_eq!(present, i >= extra, "key k{} presence", i);
        }
        prop_assert_eq!(store.stats().evictions, extra as u64);
    }

    // Values above the single-item limit are never retrievable.
    #[test]
    fn prop_oversized_never_cached(key in key_strategy(), len in 33usize..200) {
        let mut store = store_with(CacheLimits {
            single_item_byte_limit: 32,
            ..limits(TEST_MAX_ENTRIES, TEST_MAX_BYTES, 300)
        });

        let outcome = store.put(key.as_str(), "x".repeat(len));
        let skipped = matches!(outcome, PutOutcome::Skipped(_));
        prop_assert!(skipped);
        prop_assert_eq!(store.get(&CacheKey::from(key)), None);
        prop_assert_eq!(store.len(), 0);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(30))]

    // Walking every page yields each matching document exactly once, in order.
    #[test]
    fn prop_pagination_walk_has_no_gaps(
        ranks in prop::collection::vec(0i64..5, 0..40),
        page_size in 1usize..10,
    ) {
        let (store, access) = fixture::access();
        for (i, rank) in ranks.iter().enumerate() {
            store.insert("posts", &format!("p{:03}", i), json!({"rank": rank}));
        }
        let constraints = QueryConstraints::new().order_by("rank", Direction::Asc);

        let mut expected: Vec<(i64, String)> = ranks
            .iter()
            .enumerate()
            .map(|(i, rank)| (*rank, format!("p{:03}", i)))
            .collect();
        expected.sort();

        let walked = tokio_test::block_on(async {
            let mut seen = Vec::new();
            let mut cursor = None;
            loop {
                let page = access
                    .fetch_page::<Document>("posts", &constraints, cursor.as_ref(), Some(page_size))
                    .await
                    .unwrap();
                assert!(page.items.len() <= page_size);
                seen.extend(page.items.into_iter().map(|doc| doc.id));
                if !page.has_more {
                    break;
                }
                cursor = page.cursor;
            }
            seen
        });

        let expected_ids: Vec<String> = expected.into_iter().map(|(_, id)| id).collect();
        let unique: HashSet<&String> = walked.iter().collect();
        prop_assert_eq!(unique.len(), walked.len(), "duplicate across pages");
        prop_assert_eq!(walked, expected_ids);
    }

    // The writer never holds more than its ceiling and commits ceil(n / max) times.
    #[test]
    fn prop_batch_writer_respects_ceiling(n in 0usize..60, max_ops in 1usize..12) {
        let store = Arc::new(MemoryStore::new().with_max_ops(max_ops));
        let mut writer = BatchWriter::new(Arc::clone(&store), max_ops, None);

        let reports = tokio_test::block_on(async {
            let mut reports = Vec::new();
            for i in 0..n {
                let op = BatchOperation::Set {
                    target: DocRef::new("items", format!("i{}", i)),
                    payload: json!({"n": i}).as_object().cloned().unwrap_or_default(),
                };
                if let Some(report) = writer.stage(op).await.unwrap() {
                    reports.push(report);
                }
                assert!(writer.pending_count() <= max_ops);
            }
            if let Some(report) = writer.commit().await.unwrap() {
                reports.push(report);
            }
            reports
        });

        prop_assert_eq!(reports.len(), n.div_ceil(max_ops));
        prop_assert!(reports.iter().all(|r| r.operations <= max_ops));
        prop_assert_eq!(reports.iter().map(|r| r.operations).sum::<usize>(), n);
        prop_assert_eq!(store.count("items"), n);
        prop_assert_eq!(writer.pending_count(), 0);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(3))]

    // Entries read as absent once older than the TTL.
    #[test]
    fn prop_ttl_expiration(key in key_strategy(), value in value_strategy()) {
        let mut store = store_with(limits(TEST_MAX_ENTRIES, TEST_MAX_BYTES, 1));
        let cache_key = CacheKey::from(key.as_str());

        store.put(key.as_str(), value.clone());
        prop_assert_eq!(store.get(&cache_key), Some(value));

        sleep(Duration::from_millis(1100));

        prop_assert_eq!(store.get(&cache_key), None);
        prop_assert_eq!(store.len(), 0);
        prop_assert_eq!(store.stats().expirations, 1);
    }
}

#[test]
fn test_default_limits_follow_config() {
    let limits = CacheLimits::default();
    let config = Config::default();
    assert_eq!(limits.max_entries, config.max_entries);
    assert_eq!(limits.max_total_bytes, config.max_total_bytes);
}

//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check the ring queue against a reference FIFO and the
//! cache's read/write and rate-limit behavior against a memory store.

use proptest::prelude::*;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::{CacheOptions, ExpiringCache, RingQueue, ScheduleToken};
use crate::store::MemoryStore;

// == Strategies ==
/// Generates valid field names
fn field_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_]{1,32}".prop_map(|s| s)
}

/// Generates cacheable values
fn value_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ]{0,64}".prop_map(|s| s)
}

#[derive(Debug, Clone)]
enum QueueOp {
    Push(String),
    Pop,
}

fn queue_op_strategy() -> impl Strategy<Value = QueueOp> {
    prop_oneof![
        3 => field_strategy().prop_map(QueueOp::Push),
        2 => Just(QueueOp::Pop),
    ]
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

fn long_lived_cache(rate_limit: i64) -> ExpiringCache {
    let options = CacheOptions::default()
        .data_ttl(Duration::from_secs(300))
        .rate_limit(rate_limit, Duration::from_secs(300));
    ExpiringCache::new(Arc::new(MemoryStore::new()), "prop", options)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // Interleaved pushes and pops behave exactly like a VecDeque, and the
    // queue never holds more items than it has slots.
    #[test]
    fn prop_queue_matches_reference_fifo(
        capacity in 0usize..8,
        ops in prop::collection::vec(queue_op_strategy(), 1..200)
    ) {
        let mut queue = RingQueue::new(capacity);
        let mut reference = VecDeque::new();

        for op in ops {
            match op {
                QueueOp::Push(field) => {
                    queue.push(ScheduleToken::new(field.clone()));
                    reference.push_back(ScheduleToken::new(field));
                }
                QueueOp::Pop => {
                    prop_assert_eq!(queue.pop(), reference.pop_front());
                }
            }
            prop_assert_eq!(queue.len(), reference.len());
            prop_assert!(queue.len() <= queue.capacity());
        }
    }

    // Pushing more tokens than the initial capacity and draining yields the
    // same tokens in the same order, leaving the queue empty.
    #[test]
    fn prop_queue_growth_preserves_order(
        capacity in 1usize..6,
        fields in prop::collection::vec(field_strategy(), 1..100)
    ) {
        let mut queue = RingQueue::new(capacity);
        for field in &fields {
            queue.push(field.clone());
        }

        let drained: Vec<String> = std::iter::from_fn(|| queue.pop()).collect();
        prop_assert_eq!(drained, fields);
        prop_assert!(queue.is_empty());
    }

    // Storing a value and reading it back (without clear) returns the value,
    // and the entry stays readable.
    #[test]
    fn prop_set_get_round_trip(field in field_strategy(), value in value_strategy()) {
        let rt = runtime();
        rt.block_on(async {
            let cache = long_lived_cache(0);
            cache.set(&field, "", value.clone()).await.unwrap();

            let first = cache.get(&field, false).await.unwrap().unwrap();
            let second = cache.get(&field, false).await.unwrap().unwrap();
            assert_eq!(first.value, serde_json::json!(value));
            assert_eq!(first, second);
        });
    }

    // Reading with clear returns the value once; the next read is absent.
    #[test]
    fn prop_clear_on_read(field in field_strategy(), value in value_strategy()) {
        let rt = runtime();
        rt.block_on(async {
            let cache = long_lived_cache(0);
            cache.set(&field, "", value).await.unwrap();

            assert!(cache.get(&field, true).await.unwrap().is_some());
            assert!(cache.get(&field, false).await.unwrap().is_none());
        });
    }

    // With limit N, N-1 hits stay valid and the N-th hit exhausts the window.
    #[test]
    fn prop_rate_limit_threshold(limit in 1i64..10, field in field_strategy()) {
        let rt = runtime();
        rt.block_on(async {
            let cache = long_lived_cache(limit);
            assert!(cache.valid_times(&field).await.unwrap());

            for _ in 0..limit - 1 {
                cache.add_times(&field).await.unwrap();
            }
            assert!(cache.valid_times(&field).await.unwrap());

            cache.add_times(&field).await.unwrap();
            assert!(!cache.valid_times(&field).await.unwrap());
        });
    }
}

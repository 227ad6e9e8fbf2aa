//! Property-based tests for batching and sampling.
//!
//! Uses proptest to verify invariants across random inputs:
//! - Chunks concatenate back to the input
//! - Chunk sizes and counts follow the batch limit
//! - Samples are distinct members of the population
//! - Upserts converge to one row per key

// Property tests use expect/unwrap for simplicity - panics are acceptable in tests
#![allow(clippy::expect_used, clippy::unwrap_used)]

use proptest::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;
use randomness::storage::SessionStore;
use randomness::{BatchChunker, Error, chunk, sample};
use std::collections::HashSet;

proptest! {
    /// Property: concatenating the chunks yields the input.
    #[test]
    fn prop_chunks_concatenate_to_input(
        items in prop::collection::vec(any::<u32>(), 0..500),
        max_size in 1usize..150
    ) {
        let rejoined: Vec<u32> = chunk(&items, max_size).concat();
        prop_assert_eq!(rejoined, items);
    }

    /// Property: every chunk is non-empty and only the last may be short.
    #[test]
    fn prop_chunk_sizes_bounded(
        len in 0usize..500,
        max_size in 1usize..150
    ) {
        let items: Vec<usize> = (0..len).collect();
        let chunks = chunk(&items, max_size);

        prop_assert_eq!(chunks.len(), len.div_ceil(max_size));
        for (i, c) in chunks.iter().enumerate() {
            prop_assert!(!c.is_empty());
            if i + 1 < chunks.len() {
                prop_assert_eq!(c.len(), max_size);
            } else {
                prop_assert!(c.len() <= max_size);
            }
        }
    }

    /// Property: inputs no longer than the limit stay in one chunk.
    #[test]
    fn prop_short_input_single_chunk(len in 1usize..100) {
        let items: Vec<usize> = (0..len).collect();
        let chunks = BatchChunker::default().chunk(&items, 0);
        prop_assert_eq!(chunks.len(), 1);
        prop_assert_eq!(chunks[0], items.as_slice());
    }

    /// Property: samples are distinct positions of the population.
    #[test]
    fn prop_sample_distinct_members(
        len in 0usize..400,
        amount in 0usize..400,
        seed in any::<u64>()
    ) {
        let population: Vec<usize> = (0..len).collect();
        let mut rng = StdRng::seed_from_u64(seed);

        match sample(&population, amount, &mut rng) {
            Ok(picked) => {
                prop_assert!(amount <= len);
                prop_assert_eq!(picked.len(), amount);
                let unique: HashSet<_> = picked.iter().collect();
                prop_assert_eq!(unique.len(), amount);
                prop_assert!(picked.iter().all(|p| *p < len));
            },
            Err(Error::InsufficientData { requested, available }) => {
                prop_assert!(amount > len);
                prop_assert_eq!(requested, amount);
                prop_assert_eq!(available, len);
            },
            Err(e) => prop_assert!(false, "unexpected error: {e}"),
        }
    }

    /// Property: repeated upserts of the same session leave one row holding the last values.
    #[test]
    fn prop_session_upsert_idempotent(counts in prop::collection::vec(0usize..1000, 1..10)) {
        let store = SessionStore::in_memory().unwrap();
        for (i, count) in counts.iter().enumerate() {
            store.record_sync(&format!("playlist-{i}"), *count).unwrap();
        }

        let row = store.current().unwrap().unwrap();
        prop_assert_eq!(row.id.as_str(), store.id());
        prop_assert_eq!(row.track_count, i64::try_from(*counts.last().unwrap()).unwrap());
        prop_assert_eq!(row.playlist_id, Some(format!("playlist-{}", counts.len() - 1)));
        prop_assert_eq!(store.latest().unwrap().map(|r| r.id), Some(store.id().to_string()));
    }
}

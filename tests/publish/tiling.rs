//! Random groups: the slices of every process tile the global array.

use crate::common::*;
use proptest::prelude::*;
use snapstage::codec::decode_i64;
use snapstage::{DumpConfig, MemoryStore, StoreOp};

fn group() -> impl Strategy<Value = (Vec<u64>, usize)> {
    (prop::collection::vec(0u64..6, 1..6), 1usize..5)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_read_back_is_rank_concatenation((counts, fields) in group()) {
        let store = MemoryStore::new();
        let config = DumpConfig::new("atoms");
        let reports = run_steps(&store, &config, fields, &[(1, counts.clone())]);

        let total: u64 = counts.iter().sum();
        prop_assert_eq!(store.shape("atoms"), Some(vec![fields as u64, total]));
        prop_assert_eq!(read_snapshot(&store, "atoms", 1), expected_array(1, &counts, fields));

        let mut offset = 0;
        for (rank, count) in counts.iter().enumerate() {
            prop_assert_eq!(reports[rank][0].offsets.local_offset, offset);
            prop_assert_eq!(reports[rank][0].bounds.is_some(), *count > 0);
            offset += count;
        }
    }

    #[test]
    fn prop_puts_only_from_nonempty_ranks((counts, fields) in group()) {
        let store = MemoryStore::new();
        let config = DumpConfig::new("atoms");
        run_steps(&store, &config, fields, &[(4, counts.clone())]);

        let mut writers: Vec<usize> = store.events(StoreOp::Put).iter().map(|e| e.rank).collect();
        writers.sort_unstable();
        let nonempty: Vec<usize> = (0..counts.len()).filter(|r| counts[*r] > 0).collect();
        prop_assert_eq!(writers, nonempty);

        let natoms: Vec<_> = store
            .events(StoreOp::PutMeta)
            .into_iter()
            .filter(|e| e.key == "natoms")
            .collect();
        prop_assert_eq!(natoms.len(), 1);
        prop_assert_eq!(natoms[0].rank, 0);
        let total = decode_i64(&store.read_meta("natoms", 4).unwrap()).unwrap();
        prop_assert_eq!(total as u64, counts.iter().sum::<u64>());
    }
}

//! The three-process reference snapshot, checked cell by cell.

use crate::common::*;
use snapstage::codec::decode_i64;
use snapstage::{Bounds, DumpConfig, MemoryStore, StoreOp};

const FIELDS: usize = 4;

#[test]
fn test_three_ranks_offsets_and_bounds() {
    init_tracing();
    let store = MemoryStore::new();
    let config = DumpConfig::new("atoms");
    let reports = run_steps(&store, &config, FIELDS, &[(100, vec![2, 3, 1])]);

    let offsets: Vec<u64> = reports.iter().map(|r| r[0].offsets.local_offset).collect();
    assert_eq!(offsets, vec![0, 2, 5]);
    assert!(reports.iter().all(|r| r[0].offsets.total == 6));
    assert_eq!(
        reports[1][0].bounds,
        Some(Bounds {
            lower: [0, 2],
            upper: [3, 4]
        })
    );
    assert_eq!(
        reports[2][0].bounds,
        Some(Bounds {
            lower: [0, 5],
            upper: [3, 5]
        })
    );
}

#[test]
fn test_three_ranks_read_back() {
    init_tracing();
    let store = MemoryStore::new();
    let config = DumpConfig::new("atoms");
    run_steps(&store, &config, FIELDS, &[(100, vec![2, 3, 1])]);

    assert_eq!(store.shape("atoms"), Some(vec![4, 6]));
    assert_eq!(
        read_snapshot(&store, "atoms", 100),
        expected_array(100, &[2, 3, 1], FIELDS)
    );

    let natoms = store.read_meta("natoms", 100).unwrap();
    assert_eq!(decode_i64(&natoms).unwrap(), 6);
    assert_eq!(store.events(StoreOp::PutMeta).iter().filter(|e| e.key == "natoms").count(), 1);
    assert_eq!(store.events(StoreOp::Put).len(), 3);
    assert_eq!(store.events(StoreOp::DefineGdim).len(), 3);
}

#[test]
fn test_rank_with_no_records_skips_put() {
    init_tracing();
    let store = MemoryStore::new();
    let config = DumpConfig::new("atoms");
    let reports = run_steps(&store, &config, FIELDS, &[(7, vec![3, 0, 2])]);

    assert_eq!(reports[1][0].bounds, None);
    assert_eq!(reports[1][0].offsets.local_offset, 3);
    let writers: Vec<usize> = store.events(StoreOp::Put).iter().map(|e| e.rank).collect();
    assert!(!writers.contains(&1));
    assert_eq!(writers.len(), 2);
    assert_eq!(
        read_snapshot(&store, "atoms", 7),
        expected_array(7, &[3, 0, 2], FIELDS)
    );
}

#[test]
fn test_dataset_name_drops_percent() {
    init_tracing();
    let store = MemoryStore::new();
    let config = DumpConfig::new("d1").with_dataset("dump.%.bin");
    run_steps(&store, &config, 2, &[(3, vec![1, 1])]);

    assert_eq!(store.shape("dump..bin"), Some(vec![2, 2]));
    assert_eq!(
        read_snapshot(&store, "dump..bin", 3),
        expected_array(3, &[1, 1], 2)
    );
}

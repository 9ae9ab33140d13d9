//! Multi-snapshot runs, connection lifecycle, and file-based config.

use crate::common::*;
use snapstage::{
    spawn_ranks, DumpConfig, MemoryStore, Status, StageError, StagingClient, StoreOp,
};

#[test]
fn test_totals_vary_across_snapshots() {
    init_tracing();
    let store = MemoryStore::new();
    let config = DumpConfig::new("atoms");
    let steps = vec![
        (0, vec![2, 2]),
        (100, vec![5, 0]),
        (200, vec![1, 3]),
    ];
    let reports = run_steps(&store, &config, 3, &steps);

    for (i, (version, counts)) in steps.iter().enumerate() {
        assert_eq!(reports[0][i].offsets.total, counts.iter().sum::<u64>());
        assert_eq!(
            read_snapshot_at(&store, *version, counts, 3),
            expected_array(*version, counts, 3)
        );
    }
    // The shape entry reflects the latest declaration.
    assert_eq!(store.shape("atoms"), Some(vec![3, 4]));
}

/// Read `version` using the shape that was current when it was written.
fn read_snapshot_at(store: &MemoryStore, version: u64, counts: &[u64], fields: usize) -> Vec<f64> {
    let total: u64 = counts.iter().sum();
    if total == 0 {
        return Vec::new();
    }
    let bytes = store
        .read_array("atoms", version, 8, &[0, 0], &[fields as u64 - 1, total - 1])
        .unwrap();
    snapstage::codec::decode_f64s(&bytes).unwrap()
}

#[test]
fn test_shape_declared_by_every_rank_each_snapshot() {
    init_tracing();
    let store = MemoryStore::new();
    let config = DumpConfig::new("atoms");
    run_steps(&store, &config, 2, &[(1, vec![1, 1, 1]), (2, vec![1, 1, 1])]);

    let declarations = store.events(StoreOp::DefineGdim);
    assert_eq!(declarations.len(), 6);
    assert!(declarations.iter().all(|e| e.key == "atoms"));
    assert_eq!(store.shape("atoms"), Some(vec![2, 3]));
}

#[test]
fn test_reconnect_after_finalize_rejected() {
    init_tracing();
    let store = MemoryStore::new();
    let config = DumpConfig::new("atoms");
    run_steps(&store, &config, 2, &[(5, vec![2, 1])]);

    let results = spawn_ranks(2, |member| MemoryStore::connect(&store, &member).map(|_| ()));
    for result in &results {
        match result {
            Err(StageError::Init { status, .. }) => assert_eq!(*status, Status::ALREADY_CONNECTED),
            other => panic!("reconnected: {:?}", other),
        }
    }
    // The finished snapshot is untouched.
    assert_eq!(read_snapshot(&store, "atoms", 5), expected_array(5, &[2, 1], 2));
}

#[test]
fn test_finalize_closes_connections() {
    init_tracing();
    let store = MemoryStore::new();
    run_steps(&store, &DumpConfig::new("atoms"), 1, &[(1, vec![1, 1])]);

    assert!(!store.is_connected(0));
    assert!(!store.is_connected(1));
    assert_eq!(store.events(StoreOp::Finalize).len(), 2);
}

#[test]
fn test_client_rejects_calls_after_finalize() {
    init_tracing();
    let store = MemoryStore::new();
    spawn_ranks(1, |member| {
        let mut client = MemoryStore::connect(&store, &member).unwrap();
        client.finalize().unwrap();
        assert_eq!(
            client.define_gdim("atoms", &[1, 1]),
            Err(Status::NOT_CONNECTED)
        );
        // Finalize twice is harmless.
        assert!(client.finalize().is_ok());
    });
    assert_eq!(store.events(StoreOp::Finalize).len(), 1);
}

#[test]
fn test_config_from_file_drives_run() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dump.toml");
    std::fs::write(
        &path,
        r#"
id = "d7"
dataset = "frames.%"
leader_rank = 1

[[column]]
index = 0
label = "mass"
"#,
    )
    .unwrap();

    let config = DumpConfig::from_file(&path).unwrap();
    assert_eq!(config.dataset_name(), "frames.");
    let store = MemoryStore::new();
    run_steps(&store, &config, 2, &[(3, vec![1, 2])]);

    assert_eq!(read_snapshot(&store, "frames.", 3), expected_array(3, &[1, 2], 2));
    let names = store.read_meta("column_names", 0).unwrap();
    assert_eq!(String::from_utf8(names).unwrap(), "mass f1");
    assert!(store.events(StoreOp::PutMeta).iter().all(|e| e.rank == 1));
}

//! Store and group failures: reported with context, never retried.

use crate::common::*;
use snapstage::{
    spawn_ranks, CollectiveError, Communicator, DumpConfig, MemoryStore, PackedRecords,
    SnapshotReport, StageError, StageResult, Status, StoreOp,
};
use std::sync::{Arc, Barrier};

const FIELDS: usize = 2;

/// One snapshot at `version` with `counts[rank]` records per rank.
fn write_once(
    store: &Arc<MemoryStore>,
    config: &DumpConfig,
    version: u64,
    counts: &[u64],
) -> Vec<StageResult<SnapshotReport>> {
    spawn_ranks(counts.len(), |member| -> StageResult<SnapshotReport> {
        let rank = member.rank();
        let mut stage = open_stage(store, member, config.clone(), FIELDS)?;
        stage.init(cube(1.0))?;
        let cells = rank_cells(version, rank, counts[rank], FIELDS);
        let mut source = PackedRecords::new(&cells, FIELDS)?;
        stage.write(version, &mut source)
    })
}

fn departed(result: &StageResult<SnapshotReport>, who: usize) -> bool {
    matches!(
        result,
        Err(StageError::Collective(CollectiveError::MemberDeparted { rank, .. })) if *rank == who
    )
}

#[test]
fn test_put_failure_reports_op_and_code() {
    init_tracing();
    let store = MemoryStore::new();
    store.inject_failure_on(1, StoreOp::Put, Status::from_code(-3));
    let results = write_once(&store, &DumpConfig::new("atoms"), 9, &[1, 2, 1]);

    let err = results[1].as_ref().unwrap_err();
    assert_eq!(err.op(), Some(StoreOp::Put));
    assert_eq!(err.status(), Some(Status::from_code(-3)));
    let message = err.to_string();
    assert!(message.contains("put"), "{}", message);
    assert!(message.contains("status code = -3"), "{}", message);

    // Puts follow the last collective, so peers are unaffected.
    assert!(results[0].is_ok());
    assert!(results[2].is_ok());
    let writers: Vec<usize> = store.events(StoreOp::Put).iter().map(|e| e.rank).collect();
    assert!(!writers.contains(&1));
    assert!(store.read_meta("natoms", 9).is_some());
}

#[test]
fn test_define_gdim_failure_stops_later_steps() {
    init_tracing();
    let store = MemoryStore::new();
    store.inject_failure_on(1, StoreOp::DefineGdim, Status::from_code(-4));
    let results = write_once(&store, &DumpConfig::new("atoms"), 2, &[2, 2, 2]);

    let err = results[1].as_ref().unwrap_err();
    assert_eq!(err.op(), Some(StoreOp::DefineGdim));
    assert!(err.to_string().contains("define_gdim"));
    assert!(departed(&results[0], 1));
    assert!(departed(&results[2], 1));

    // Nobody passed the shape barrier.
    assert!(store.events(StoreOp::Put).is_empty());
    assert!(store.read_meta("natoms", 2).is_none());
}

#[test]
fn test_overflow_detected_before_store_calls() {
    init_tracing();
    let store = MemoryStore::new();
    let mut config = DumpConfig::new("atoms");
    config.max_local_elements = 6;
    let results = write_once(&store, &config, 1, &[1, 4, 2]);

    assert!(matches!(
        results[1],
        Err(StageError::BufferOverflow {
            records: 4,
            fields: 2,
            max: 6
        })
    ));
    assert!(departed(&results[0], 1));
    assert!(departed(&results[2], 1));
    assert!(store.events(StoreOp::DefineGdim).is_empty());
    assert!(store.events(StoreOp::Put).is_empty());
}

#[test]
fn test_poisoned_stage_releases_group_while_alive() {
    init_tracing();
    let store = MemoryStore::new();
    let mut config = DumpConfig::new("atoms");
    config.max_local_elements = 4;
    let done = Barrier::new(3);

    let results = spawn_ranks(3, |member| {
        let rank = member.rank();
        let mut stage = open_stage(&store, member, config.clone(), FIELDS).unwrap();
        stage.init(cube(1.0)).unwrap();
        let cells = rank_cells(1, rank, if rank == 1 { 3 } else { 1 }, FIELDS);
        let mut source = PackedRecords::new(&cells, FIELDS).unwrap();
        let result = stage.write(1, &mut source);
        // Every stage is still alive here; peers only return because the
        // failed rank released its group handle.
        assert!(stage.is_poisoned());
        assert!(stage.comm().is_none());
        done.wait();
        result
    });

    assert!(matches!(results[1], Err(StageError::BufferOverflow { .. })));
    assert!(departed(&results[0], 1));
    assert!(departed(&results[2], 1));
}

#[test]
fn test_init_failure_fails_every_rank() {
    init_tracing();
    let store = MemoryStore::new();
    store.inject_failure_on(2, StoreOp::Init, Status::from_code(-1));

    let results = spawn_ranks(3, |member| MemoryStore::connect(&store, &member).map(|_| ()));
    for (rank, result) in results.iter().enumerate() {
        let expected = if rank == 2 {
            Status::from_code(-1)
        } else {
            MemoryStore::PEER_INIT_FAILED
        };
        match result {
            Err(StageError::Init { rank: r, status }) => {
                assert_eq!(*r, rank);
                assert_eq!(*status, expected);
            }
            other => panic!("rank {} connected: {:?}", rank, other),
        }
    }
    assert!((0..3).all(|r| !store.is_connected(r)));
}

#[test]
fn test_stage_refuses_writes_after_failure() {
    init_tracing();
    let store = MemoryStore::new();
    store.inject_failure(StoreOp::PutMeta, Status::from_code(-3));
    let config = DumpConfig::new("atoms");

    let results = spawn_ranks(2, |member| {
        let mut stage = open_stage(&store, member, config.clone(), FIELDS).unwrap();
        let init = stage.init(cube(1.0));
        let cells = [0.0; FIELDS];
        let mut source = PackedRecords::new(&cells, FIELDS).unwrap();
        let write = if stage.is_poisoned() {
            Some(stage.write(1, &mut source))
        } else {
            None
        };
        (init.is_ok(), write.map(|w| matches!(w, Err(StageError::Poisoned))))
    });

    // Schema keys are written by the leader alone.
    assert_eq!(results[0], (false, Some(true)));
    assert_eq!(results[1], (true, None));
}

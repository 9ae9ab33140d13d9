//! Shared test utilities for the integration suites.
//!
//! Import via `#[path = "../common/mod.rs"] mod common;` from a suite's main.rs.

#![allow(dead_code)]

use snapstage::codec::decode_f64s;
use snapstage::{
    spawn_ranks, BoundaryKind, BoxGeometry, DumpConfig, DumpStage, LocalMember, MemoryClient,
    MemoryStore, PackedRecords, SnapshotReport, StageResult, Version, ELEMENT_SIZE,
};
use std::sync::{Arc, Once};

static INIT_TRACING: Once = Once::new();

/// Route `tracing` output through the test harness.
pub fn init_tracing() {
    INIT_TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::DEBUG)
            .try_init();
    });
}

/// Default labels for `fields` columns: `f0 f1 ...`.
pub fn default_columns(fields: usize) -> Vec<String> {
    (0..fields).map(|i| format!("f{}", i)).collect()
}

/// Deterministic cells for a rank's records at a version.
///
/// Cell value encodes `(version, rank, local record, field)` so a misplaced
/// slice shows up as a wrong value.
pub fn rank_cells(version: Version, rank: usize, count: u64, fields: usize) -> Vec<f64> {
    let mut cells = Vec::with_capacity(count as usize * fields);
    for record in 0..count {
        for field in 0..fields {
            cells.push(
                version as f64 * 1e6 + rank as f64 * 1e4 + record as f64 * 10.0 + field as f64,
            );
        }
    }
    cells
}

/// Concatenation of every rank's cells in rank order: the expected global array.
pub fn expected_array(version: Version, counts: &[u64], fields: usize) -> Vec<f64> {
    counts
        .iter()
        .enumerate()
        .flat_map(|(rank, count)| rank_cells(version, rank, *count, fields))
        .collect()
}

/// Read a whole snapshot the way an out-of-band consumer would.
pub fn read_snapshot(store: &MemoryStore, dataset: &str, version: Version) -> Vec<f64> {
    let shape = store.shape(dataset).expect("shape declared");
    if shape[1] == 0 {
        return Vec::new();
    }
    let bytes = store
        .read_array(dataset, version, ELEMENT_SIZE, &[0, 0], &[shape[0] - 1, shape[1] - 1])
        .expect("snapshot fully written");
    decode_f64s(&bytes).expect("whole cells")
}

/// Periodic cube of edge `edge`.
pub fn cube(edge: f64) -> BoxGeometry {
    BoxGeometry::orthogonal([0.0; 3], [edge; 3], [[BoundaryKind::Periodic; 2]; 3])
}

/// Connect one rank and build its dump stage.
pub fn open_stage(
    store: &Arc<MemoryStore>,
    member: LocalMember,
    config: DumpConfig,
    fields: usize,
) -> StageResult<DumpStage<MemoryClient, LocalMember>> {
    let client = MemoryStore::connect(store, &member)?;
    DumpStage::new(config, client, member, &default_columns(fields))
}

/// Run one snapshot per entry of `steps` on a group of `counts.len()` ranks.
///
/// `steps[i]` is `(version, per-rank counts)`; every step must have one count
/// per rank. Returns each rank's reports in step order.
pub fn run_steps(
    store: &Arc<MemoryStore>,
    config: &DumpConfig,
    fields: usize,
    steps: &[(Version, Vec<u64>)],
) -> Vec<Vec<SnapshotReport>> {
    let size = steps.first().map(|(_, c)| c.len()).unwrap_or(1);
    spawn_ranks(size, |member| {
        let rank = snapstage::Communicator::rank(&member);
        let mut stage = open_stage(store, member, config.clone(), fields).expect("stage opens");
        stage.init(cube(10.0)).expect("init");
        let mut reports = Vec::new();
        for (version, counts) in steps {
            let cells = rank_cells(*version, rank, counts[rank], fields);
            let mut source = PackedRecords::new(&cells, fields).expect("whole records");
            reports.push(stage.write(*version, &mut source).expect("write"));
        }
        stage.finalize().expect("finalize");
        reports
    })
}

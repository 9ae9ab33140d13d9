//! snapstage - collective snapshot publication into an in-memory staging store
//!
//! Many processes each hold part of a simulation's records. For every
//! snapshot they agree on a layout, and each writes its slice of one logical
//! 2D array `[fields, total records]` into the staging store, where analysis
//! or visualization processes can read a consistent global array without
//! file I/O. A leader publishes the column schema and box geometry once
//! under well-known metadata keys.
//!
//! # Quick Start
//!
//! ```ignore
//! use snapstage::{BoxGeometry, DumpConfig, DumpStage, MemoryStore, PackedRecords, SoloGroup};
//!
//! let store = MemoryStore::new();
//! let client = MemoryStore::connect(&store, &SoloGroup)?;
//! let mut stage = DumpStage::new(DumpConfig::new("atoms"), client, SoloGroup, &["id", "x", "y", "z"])?;
//! stage.init(geometry)?;
//!
//! for step in (0..1000).step_by(100) {
//!     let mut records = PackedRecords::new(&cells, 4)?;
//!     stage.write(step, &mut records)?;
//! }
//! stage.finalize()?;
//! ```
//!
//! # Architecture
//!
//! - `snapstage-core`: shared types, errors, and the `Communicator` /
//!   `StagingClient` seams
//! - `snapstage-collective`: process groups and offset aggregation
//! - `snapstage-storage`: the in-process staging store
//! - `snapstage-engine`: placement, publishers, configuration, dump stage

pub use snapstage_collective::{
    spawn_ranks, GroupOffsetAggregator, GroupOffsets, LocalGroup, LocalMember, SoloGroup,
};
pub use snapstage_core::codec;
pub use snapstage_core::{
    BoundaryKind, Bounds, BoxGeometry, CollectiveError, CollectiveKind, Communicator,
    DecodeError, Limits, Rank, StageError, StageResult, StagingClient, Status, StatusResult,
    StoreOp, Version, ELEMENT_SIZE, GEOMETRY_RECORD_LEN,
};
pub use snapstage_engine::{
    ArrayPlacement, ColumnLabel, ColumnSchema, DumpConfig, DumpStage, GeometryPolicy,
    LocalBuffer, MetaKeys, PackedRecords, RecordSource, Role, SchemaMetadataPublisher,
    SnapshotPublisher, SnapshotReport, DEFAULT_LEADER_RANK, SCHEMA_VERSION,
};
pub use snapstage_storage::{MemoryClient, MemoryStore, StoreEvent};

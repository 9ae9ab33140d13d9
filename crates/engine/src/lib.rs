//! Snapshot and schema publication
//!
//! This crate turns a process's local records into its slice of a shared
//! global array in the staging store:
//! - ArrayPlacement: bounds a process claims from its offset and count
//! - LocalBuffer: growth-only buffer reused across snapshots
//! - SnapshotPublisher: the per-snapshot shape / count / slice protocol
//! - ColumnSchema / SchemaMetadataPublisher: one-time leader metadata
//! - DumpConfig: TOML configuration
//! - DumpStage: lifecycle facade tying the above to one client and group

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod buffer;
pub mod config;
pub mod dump;
pub mod placement;
pub mod role;
pub mod schema;
pub mod snapshot;

pub use buffer::LocalBuffer;
pub use config::{ColumnLabel, DumpConfig, GeometryPolicy, MetaKeys};
pub use dump::DumpStage;
pub use placement::ArrayPlacement;
pub use role::{Role, DEFAULT_LEADER_RANK};
pub use schema::{ColumnSchema, SchemaMetadataPublisher, SCHEMA_VERSION};
pub use snapshot::{PackedRecords, RecordSource, SnapshotPublisher, SnapshotReport};

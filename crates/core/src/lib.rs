//! Core types and traits for snapstage
//!
//! This crate defines the foundational types shared by every layer:
//! - Rank / Version: process and snapshot identifiers
//! - Status / StoreOp: staging store status codes and operation names
//! - Bounds: inclusive 2D bounding box of a published slice
//! - BoxGeometry / BoundaryKind: simulation box description for metadata
//! - codec: little-endian metadata payload encodings
//! - Limits: per-process buffer size limits
//! - Error: StageError and CollectiveError
//! - Traits: Communicator (process group) and StagingClient (store handle)

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod codec;
pub mod error;
pub mod geometry;
pub mod limits;
pub mod traits;
pub mod types;

pub use codec::DecodeError;
pub use error::{CollectiveError, CollectiveKind, StageError, StageResult};
pub use geometry::{BoundaryKind, BoxGeometry, GEOMETRY_RECORD_LEN};
pub use limits::Limits;
pub use traits::{Communicator, StagingClient};
pub use types::{Bounds, Rank, Status, StatusResult, StoreOp, Version, ELEMENT_SIZE};

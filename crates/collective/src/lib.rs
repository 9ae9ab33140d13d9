//! Process groups and collective offset aggregation
//!
//! This crate provides the process-group side of snapshot publication:
//! - LocalGroup: members living on threads of one process (tests, single node)
//! - SoloGroup: a group of one, for runs without a parallel launcher
//! - GroupOffsetAggregator: global record total and exclusive prefix offset

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod aggregator;
pub mod local;
pub mod solo;

pub use aggregator::{GroupOffsetAggregator, GroupOffsets};
pub use local::{spawn_ranks, LocalGroup, LocalMember};
pub use solo::SoloGroup;

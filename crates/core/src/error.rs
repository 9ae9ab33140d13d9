//! Error types for snapstage
//!
//! This module defines all error types used throughout the system.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! Every error is fatal for the process that observes it. Nothing here is
//! retried: a partially published snapshot is never safe to consume.

use crate::codec::DecodeError;
use crate::types::{Rank, Status, StoreOp, Version};
use std::fmt;
use std::io;
use thiserror::Error;

/// Result type alias for snapstage operations
pub type StageResult<T> = std::result::Result<T, StageError>;

/// Kind of collective call, used to detect diverged control flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectiveKind {
    /// Sum over all members
    AllReduceSum,
    /// Inclusive prefix sum by rank
    ScanSum,
    /// Pure synchronization
    Barrier,
}

impl fmt::Display for CollectiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CollectiveKind::AllReduceSum => "all_reduce_sum",
            CollectiveKind::ScanSum => "scan_sum",
            CollectiveKind::Barrier => "barrier",
        })
    }
}

/// Failure of a collective operation over a process group
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollectiveError {
    /// A member left the group while others waited for it
    #[error("rank {rank} left the process group (generation {generation})")]
    MemberDeparted {
        /// Rank that left
        rank: Rank,
        /// Generation the waiting members were in
        generation: u64,
    },

    /// Members entered different collectives in the same generation
    #[error(
        "collective mismatch in generation {generation}: rank {rank} called {found}, group is in {expected}"
    )]
    Diverged {
        /// Generation in which the mismatch was seen
        generation: u64,
        /// Rank whose call did not match
        rank: Rank,
        /// Collective the group already started
        expected: CollectiveKind,
        /// Collective the rank attempted
        found: CollectiveKind,
    },

    /// A reduction overflowed its 64-bit accumulator
    #[error("{kind} overflowed the 64-bit accumulator")]
    Overflow {
        /// Reduction that overflowed
        kind: CollectiveKind,
    },
}

/// Error types for snapshot publication
#[derive(Debug, Error)]
pub enum StageError {
    /// The staging store connection could not be established
    #[error("staging client init failed on rank {rank}, status code = {status}")]
    Init {
        /// Rank that failed to connect
        rank: Rank,
        /// Store status
        status: Status,
    },

    /// A staging store call returned a non-success status
    #[error("{op}({key}, version {version}) failed, status code = {status}")]
    Store {
        /// Failing operation
        op: StoreOp,
        /// Dataset name or metadata key
        key: String,
        /// Version the call addressed
        version: Version,
        /// Store status
        status: Status,
    },

    /// Local records x fields exceeds what one process may publish
    #[error("too much per-process data: {records} records x {fields} fields exceeds {max} elements")]
    BufferOverflow {
        /// Local record count
        records: u64,
        /// Field count
        fields: usize,
        /// Maximum number of elements allowed
        max: u64,
    },

    /// Collective operation failure
    #[error("collective error: {0}")]
    Collective(#[from] CollectiveError),

    /// Metadata payload could not be decoded
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Invalid configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error (configuration files)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Invalid argument supplied by the caller
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// An earlier fatal error ended this process's participation
    #[error("dump stage stopped after an earlier fatal error")]
    Poisoned,
}

impl StageError {
    /// Build a store failure with its diagnostic context.
    pub fn store(op: StoreOp, key: impl Into<String>, version: Version, status: Status) -> Self {
        StageError::Store {
            op,
            key: key.into(),
            version,
            status,
        }
    }

    /// Build a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        StageError::Config(msg.into())
    }

    /// Store status carried by this error, if any.
    pub fn status(&self) -> Option<Status> {
        match self {
            StageError::Init { status, .. } | StageError::Store { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Store operation carried by this error, if any.
    pub fn op(&self) -> Option<StoreOp> {
        match self {
            StageError::Init { .. } => Some(StoreOp::Init),
            StageError::Store { op, .. } => Some(*op),
            _ => None,
        }
    }
}

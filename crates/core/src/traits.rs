//! Seams to the two external collaborators
//!
//! [`Communicator`] abstracts the process group the snapshot is published
//! from; [`StagingClient`] abstracts one process's connection to the staging
//! store. Publication code is generic over both so it runs unchanged against
//! the in-process implementations and a real deployment.

use crate::error::CollectiveError;
use crate::types::{Rank, StatusResult, Version};

/// A fixed group of cooperating processes
///
/// Every collective method must be called by all members in the same order.
/// A call does not return until the whole group has reached it, so each one
/// is also a synchronization point.
pub trait Communicator {
    /// This member's rank, `0..size()`.
    fn rank(&self) -> Rank;

    /// Number of members in the group.
    fn size(&self) -> usize;

    /// Sum of `value` over all members.
    fn all_reduce_sum(&self, value: u64) -> Result<u64, CollectiveError>;

    /// Inclusive prefix sum: `value` summed over ranks `0..=self.rank()`.
    fn scan_sum(&self, value: u64) -> Result<u64, CollectiveError>;

    /// Wait until every member reaches this call.
    fn barrier(&self) -> Result<(), CollectiveError>;
}

/// One process's handle to the staging store
///
/// Arrays are addressed by `(name, version)` and written as inclusive
/// rectangular regions `lb..=ub`, axis 0 fastest varying. Metadata entries
/// are opaque payloads addressed by `(key, version)`. Every call returns the
/// store's raw status on failure.
pub trait StagingClient {
    /// Declare (or overwrite) the global shape associated with `name`.
    fn define_gdim(&self, name: &str, shape: &[u64]) -> StatusResult<()>;

    /// Write one rectangular region of `name` at `version`.
    fn put(
        &self,
        name: &str,
        version: Version,
        elem_size: usize,
        lb: &[u64],
        ub: &[u64],
        data: &[u8],
    ) -> StatusResult<()>;

    /// Write a metadata entry.
    fn put_meta(&self, key: &str, version: Version, payload: &[u8]) -> StatusResult<()>;

    /// Read one rectangular region of `name` at `version`.
    fn get(
        &self,
        name: &str,
        version: Version,
        elem_size: usize,
        lb: &[u64],
        ub: &[u64],
    ) -> StatusResult<Vec<u8>>;

    /// Read a metadata entry, `None` if it was never written.
    fn get_meta(&self, key: &str, version: Version) -> StatusResult<Option<Vec<u8>>>;

    /// Currently declared global shape of `name`.
    fn gdim(&self, name: &str) -> StatusResult<Option<Vec<u64>>>;

    /// Release the connection. Later calls fail with `NOT_CONNECTED`.
    fn finalize(&mut self) -> StatusResult<()>;
}

//! Global record total and per-process offset
//!
//! Each process knows only how many records it holds. Two collectives turn
//! that into its place in the shared array: a sum gives the global total and
//! an inclusive scan minus the local count gives the exclusive prefix sum,
//! i.e. the number of records held by lower ranks.
//!
//! Both calls block until the whole group has contributed, which makes the
//! aggregation the synchronization point of the snapshot pipeline: no process
//! can publish snapshot N until every process has agreed on N's layout.

use snapstage_core::{CollectiveError, Communicator};
use tracing::debug;

/// Layout of one process's records within a snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupOffsets {
    /// Records across the whole group
    pub total: u64,
    /// Records held by strictly lower ranks
    pub local_offset: u64,
    /// Records held by this process
    pub local_count: u64,
}

/// Computes [`GroupOffsets`] over a process group
pub struct GroupOffsetAggregator<'a, G: Communicator + ?Sized> {
    comm: &'a G,
}

impl<'a, G: Communicator + ?Sized> GroupOffsetAggregator<'a, G> {
    /// Aggregate over `comm`.
    pub fn new(comm: &'a G) -> Self {
        Self { comm }
    }

    /// Collective: every member must call this with its own count.
    pub fn aggregate(&self, local_count: u64) -> Result<GroupOffsets, CollectiveError> {
        let total = self.comm.all_reduce_sum(local_count)?;
        let inclusive = self.comm.scan_sum(local_count)?;
        debug_assert!(inclusive >= local_count);
        let local_offset = inclusive.saturating_sub(local_count);

        debug!(target: "snapstage::collective", rank = self.comm.rank(), local_count, local_offset, total, "Group offsets aggregated");

        Ok(GroupOffsets {
            total,
            local_offset,
            local_count,
        })
    }
}

//! Single-member process group

use snapstage_core::{CollectiveError, Communicator, Rank};

/// A group containing only the calling process.
///
/// Every collective completes immediately with the caller's own value.
#[derive(Debug, Clone, Copy, Default)]
pub struct SoloGroup;

impl Communicator for SoloGroup {
    fn rank(&self) -> Rank {
        0
    }

    fn size(&self) -> usize {
        1
    }

    fn all_reduce_sum(&self, value: u64) -> Result<u64, CollectiveError> {
        Ok(value)
    }

    fn scan_sum(&self, value: u64) -> Result<u64, CollectiveError> {
        Ok(value)
    }

    fn barrier(&self) -> Result<(), CollectiveError> {
        Ok(())
    }
}

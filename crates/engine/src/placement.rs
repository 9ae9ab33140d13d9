//! Where one process's slice lands in the global array
//!
//! Axis 0 spans fields `0..=field_count-1`; axis 1 spans this process's
//! records `local_offset..=local_offset+local_count-1`. Because offsets are
//! exclusive prefix sums, the slices of all processes tile
//! `[0, field_count) x [0, total)` with no gap and no overlap.

use snapstage_core::Bounds;
use std::ops::Range;

/// Placement of a local contribution. Pure, no I/O.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArrayPlacement {
    field_count: u64,
    local_offset: u64,
    local_count: u64,
}

impl ArrayPlacement {
    /// Placement for `local_count` records starting at global record `local_offset`.
    pub fn new(field_count: usize, local_offset: u64, local_count: u64) -> Self {
        Self {
            field_count: field_count as u64,
            local_offset,
            local_count,
        }
    }

    /// True when there is nothing to publish.
    pub fn is_empty(&self) -> bool {
        self.local_count == 0 || self.field_count == 0
    }

    /// Global record range, half-open. Empty for an empty placement.
    pub fn records(&self) -> Range<u64> {
        self.local_offset..self.local_offset + self.local_count
    }

    /// Inclusive bounds to claim, `None` when the placement is empty.
    ///
    /// An empty placement must not be published: a zero-length put is
    /// implementation-defined in the store.
    pub fn bounds(&self) -> Option<Bounds> {
        if self.is_empty() {
            return None;
        }
        Some(Bounds {
            lower: [0, self.local_offset],
            upper: [
                self.field_count - 1,
                self.local_offset + self.local_count - 1,
            ],
        })
    }
}

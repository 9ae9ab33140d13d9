//! Per-process buffer limits
//!
//! A process's packed slice is bounded so that its element count stays
//! representable by the store's transfer layer. Violations are detected before
//! any allocation or store call.

use crate::error::{StageError, StageResult};

/// Size limits enforced before packing a local slice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Maximum `records x fields` elements one process may publish (default: `i32::MAX`)
    pub max_local_elements: u64,
}

impl Default for Limits {
    fn default() -> Self {
        Limits {
            max_local_elements: i32::MAX as u64,
        }
    }
}

impl Limits {
    /// Validate a local slice and return its element count.
    pub fn check_local(&self, records: u64, fields: usize) -> StageResult<usize> {
        let overflow = || StageError::BufferOverflow {
            records,
            fields,
            max: self.max_local_elements,
        };
        let elements = records.checked_mul(fields as u64).ok_or_else(overflow)?;
        if elements > self.max_local_elements {
            return Err(overflow());
        }
        usize::try_from(elements).map_err(|_| overflow())
    }
}

//! Growth-only staging buffer for the local slice
//!
//! The buffer is reused across snapshots. It grows when a snapshot needs more
//! records than it holds and never shrinks, so a run whose record count is
//! non-decreasing reallocates O(log n) times. Growth is by half again the
//! current capacity, capped at the per-process limit.

/// Packed `f64` cells plus their byte encoding for the store
#[derive(Debug, Default)]
pub struct LocalBuffer {
    field_count: usize,
    capacity_records: usize,
    len_records: usize,
    values: Vec<f64>,
    bytes: Vec<u8>,
    reallocations: usize,
}

impl LocalBuffer {
    /// Empty buffer for records of `field_count` cells.
    pub fn new(field_count: usize) -> Self {
        Self {
            field_count,
            ..Self::default()
        }
    }

    /// Records the buffer can hold without reallocating.
    pub fn capacity_records(&self) -> usize {
        self.capacity_records
    }

    /// Number of times the buffer grew.
    pub fn reallocations(&self) -> usize {
        self.reallocations
    }

    /// Size the buffer for `records` and return the cells to pack into.
    ///
    /// `max_records` caps amortized growth; it never caps below `records`.
    pub fn prepare(&mut self, records: usize, max_records: usize) -> &mut [f64] {
        if records > self.capacity_records {
            let grown = self.capacity_records + self.capacity_records / 2;
            let target = grown.min(max_records).max(records);
            self.values = vec![0.0; target * self.field_count];
            self.bytes = Vec::with_capacity(target * self.field_count * 8);
            self.capacity_records = target;
            self.reallocations += 1;
        }
        self.len_records = records;
        &mut self.values[..records * self.field_count]
    }

    /// Cells of the current snapshot.
    pub fn values(&self) -> &[f64] {
        &self.values[..self.len_records * self.field_count]
    }

    /// Little-endian bytes of the current snapshot's cells.
    pub fn encode(&mut self) -> &[u8] {
        let cells = self.len_records * self.field_count;
        snapstage_core::codec::encode_f64s_into(&self.values[..cells], &mut self.bytes);
        &self.bytes
    }
}

//! Publication of one snapshot
//!
//! Per snapshot, every process of the group:
//! 1. sizes its growth-only buffer and packs its records (overflow is
//!    detected here, before any store call)
//! 2. aggregates the global total and its own offset (collective)
//! 3. declares the global shape `[fields, total]`, then waits for the whole
//!    group, so no data lands before every member has declared the shape
//! 4. on the leader only, publishes the record count at the snapshot version
//! 5. publishes its slice, unless it holds no records
//!
//! Any failed step returns immediately; later steps are not attempted.

use snapstage_collective::{GroupOffsetAggregator, GroupOffsets};
use snapstage_core::codec::encode_i64;
use snapstage_core::{
    BoxGeometry, Bounds, Communicator, Limits, StageError, StageResult, StagingClient, StoreOp,
    Version, ELEMENT_SIZE,
};
use tracing::debug;

use crate::buffer::LocalBuffer;
use crate::placement::ArrayPlacement;
use crate::role::Role;

/// Producer of this process's records for a snapshot
pub trait RecordSource {
    /// Records this process contributes to the current snapshot.
    fn local_count(&mut self) -> u64;

    /// Pack the records row-major, fields contiguous per record.
    ///
    /// `buf` holds exactly `local_count() * field_count` cells.
    fn pack(&mut self, buf: &mut [f64]);

    /// Cells per record, when the source fixes it.
    ///
    /// A source that reports a count different from the publisher's is
    /// rejected before packing.
    fn field_count(&self) -> Option<usize> {
        None
    }

    /// Current box geometry, when it can change between snapshots.
    fn box_geometry(&self) -> Option<BoxGeometry> {
        None
    }
}

/// Records already packed by the caller
#[derive(Debug, Clone, Copy)]
pub struct PackedRecords<'a> {
    cells: &'a [f64],
    field_count: usize,
}

impl<'a> PackedRecords<'a> {
    /// Wrap `cells`, which must hold whole records of `field_count` cells.
    pub fn new(cells: &'a [f64], field_count: usize) -> StageResult<Self> {
        if field_count == 0 || cells.len() % field_count != 0 {
            return Err(StageError::InvalidArgument(format!(
                "{} cells do not form whole records of {} fields",
                cells.len(),
                field_count
            )));
        }
        Ok(Self { cells, field_count })
    }
}

impl RecordSource for PackedRecords<'_> {
    fn local_count(&mut self) -> u64 {
        (self.cells.len() / self.field_count) as u64
    }

    fn pack(&mut self, buf: &mut [f64]) {
        buf.copy_from_slice(self.cells);
    }

    fn field_count(&self) -> Option<usize> {
        Some(self.field_count)
    }
}

/// Outcome of one process's part of a snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotReport {
    /// Snapshot version
    pub version: Version,
    /// Global layout agreed by the group
    pub offsets: GroupOffsets,
    /// Claimed region, `None` when nothing was published
    pub bounds: Option<Bounds>,
}

/// Publishes snapshots of one dataset from one process
pub struct SnapshotPublisher {
    dataset: String,
    field_count: usize,
    natoms_key: String,
    role: Role,
    limits: Limits,
    buffer: LocalBuffer,
}

impl SnapshotPublisher {
    /// Publisher for `dataset` with `field_count` fields per record.
    pub fn new(
        dataset: impl Into<String>,
        field_count: usize,
        natoms_key: impl Into<String>,
        role: Role,
        limits: Limits,
    ) -> StageResult<Self> {
        if field_count == 0 {
            return Err(StageError::config("a snapshot needs at least one field"));
        }
        Ok(Self {
            dataset: dataset.into(),
            field_count,
            natoms_key: natoms_key.into(),
            role,
            limits,
            buffer: LocalBuffer::new(field_count),
        })
    }

    /// Dataset name in the store.
    pub fn dataset(&self) -> &str {
        &self.dataset
    }

    /// Fields per record.
    pub fn field_count(&self) -> usize {
        self.field_count
    }

    /// The reusable local buffer.
    pub fn buffer(&self) -> &LocalBuffer {
        &self.buffer
    }

    /// Collective: publish snapshot `version`.
    pub fn publish<C, G, S>(
        &mut self,
        client: &C,
        comm: &G,
        version: Version,
        source: &mut S,
    ) -> StageResult<SnapshotReport>
    where
        C: StagingClient + ?Sized,
        G: Communicator + ?Sized,
        S: RecordSource + ?Sized,
    {
        if let Some(fields) = source.field_count() {
            if fields != self.field_count {
                return Err(StageError::InvalidArgument(format!(
                    "records of {} fields given to dataset '{}' of {} fields",
                    fields, self.dataset, self.field_count
                )));
            }
        }
        let local_count = source.local_count();
        let records = self.limits.check_local(local_count, self.field_count)? / self.field_count;
        let max_records =
            usize::try_from(self.limits.max_local_elements / self.field_count as u64)
                .unwrap_or(usize::MAX);
        source.pack(self.buffer.prepare(records, max_records));

        let offsets = GroupOffsetAggregator::new(comm).aggregate(local_count)?;

        let shape = [self.field_count as u64, offsets.total];
        client
            .define_gdim(&self.dataset, &shape)
            .map_err(|status| StageError::store(StoreOp::DefineGdim, &self.dataset, version, status))?;
        comm.barrier()?;

        if self.role.is_leader() {
            let total = i64::try_from(offsets.total).map_err(|_| {
                StageError::InvalidArgument(format!("record total {} exceeds i64", offsets.total))
            })?;
            client
                .put_meta(&self.natoms_key, version, &encode_i64(total))
                .map_err(|status| {
                    StageError::store(StoreOp::PutMeta, &self.natoms_key, version, status)
                })?;
        }

        let bounds = ArrayPlacement::new(self.field_count, offsets.local_offset, local_count).bounds();
        if let Some(b) = bounds {
            let data = self.buffer.encode();
            client
                .put(&self.dataset, version, ELEMENT_SIZE, &b.lower, &b.upper, data)
                .map_err(|status| StageError::store(StoreOp::Put, &self.dataset, version, status))?;
        }

        debug!(
            target: "snapstage::publish",
            rank = self.role.rank(),
            dataset = %self.dataset,
            version,
            total = offsets.total,
            local_offset = offsets.local_offset,
            local_count,
            "Snapshot slice published"
        );

        Ok(SnapshotReport {
            version,
            offsets,
            bounds,
        })
    }
}

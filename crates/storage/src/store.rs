//! Shared state of the in-process staging store
//!
//! # Design
//!
//! - Shapes: `name -> global shape`, overwritten by every declaration
//! - Arrays: `(name, version) -> blocks`, each block one written region
//! - Metadata: `(key, version) -> payload`
//! - Connections: one entry per rank, never reused after finalize
//!
//! The store performs no cross-operation ordering. A reader may see a new
//! shape before the matching array blocks land; publication code owns that
//! ordering.

use dashmap::DashMap;
use parking_lot::Mutex;
use snapstage_core::{
    Communicator, Rank, StageError, StageResult, Status, StatusResult, StoreOp, Version,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::client::MemoryClient;
use crate::region::Region;

/// Connection record for one rank
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Connection {
    Open,
    Finalized,
}

#[derive(Debug, Clone)]
struct Block {
    region: Region,
    data: Vec<u8>,
}

#[derive(Debug, Default)]
struct ArrayVersion {
    elem_size: usize,
    blocks: Vec<Block>,
}

#[derive(Debug, Clone, Copy)]
struct Fault {
    op: StoreOp,
    rank: Option<Rank>,
    status: Status,
}

/// One successful mutating call, as recorded in the journal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreEvent {
    /// Rank that issued the call
    pub rank: Rank,
    /// Operation
    pub op: StoreOp,
    /// Array name or metadata key (empty for init/finalize)
    pub key: String,
    /// Version addressed, if the operation is versioned
    pub version: Option<Version>,
}

/// In-process staging store
///
/// Shared by every rank of a group through an `Arc`. Each rank talks to it
/// through its own [`MemoryClient`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    shapes: DashMap<String, Vec<u64>>,
    arrays: DashMap<(String, Version), ArrayVersion>,
    meta: DashMap<(String, Version), Vec<u8>>,
    connections: Mutex<HashMap<Rank, Connection>>,
    faults: Mutex<Vec<Fault>>,
    journal: Mutex<Vec<StoreEvent>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Collective: connect every member of `comm` to the store.
    ///
    /// Each rank registers itself, then the group agrees on the outcome. If any
    /// rank failed, every rank fails: the one that failed reports its own
    /// status, the others report [`MemoryStore::PEER_INIT_FAILED`].
    pub fn connect<G: Communicator + ?Sized>(
        store: &Arc<Self>,
        comm: &G,
    ) -> StageResult<MemoryClient> {
        let rank = comm.rank();
        let local = store.register(rank);
        let failures = comm.all_reduce_sum(u64::from(local.is_err()))?;

        if let Err(status) = local {
            return Err(StageError::Init { rank, status });
        }
        if failures > 0 {
            store.connections.lock().remove(&rank);
            return Err(StageError::Init {
                rank,
                status: Self::PEER_INIT_FAILED,
            });
        }

        info!(target: "snapstage::store", rank, group_size = comm.size(), "Staging client connected");
        Ok(MemoryClient::new(Arc::clone(store), rank))
    }

    /// Status reported by ranks whose own init succeeded while a peer's failed.
    pub const PEER_INIT_FAILED: Status = Status::from_code(-6);

    fn register(&self, rank: Rank) -> StatusResult<()> {
        self.take_fault(rank, StoreOp::Init)?;
        let mut connections = self.connections.lock();
        if connections.contains_key(&rank) {
            return Err(Status::ALREADY_CONNECTED);
        }
        connections.insert(rank, Connection::Open);
        drop(connections);
        self.record(rank, StoreOp::Init, "", None);
        Ok(())
    }

    pub(crate) fn unregister(&self, rank: Rank) -> StatusResult<()> {
        self.take_fault(rank, StoreOp::Finalize)?;
        self.connections.lock().insert(rank, Connection::Finalized);
        self.record(rank, StoreOp::Finalize, "", None);
        info!(target: "snapstage::store", rank, "Staging client finalized");
        Ok(())
    }

    /// True while `rank` holds an open connection.
    pub fn is_connected(&self, rank: Rank) -> bool {
        self.connections.lock().get(&rank) == Some(&Connection::Open)
    }

    // ========================================================================
    // Fault injection and journal
    // ========================================================================

    /// Make the next `op` call from any rank fail with `status`.
    pub fn inject_failure(&self, op: StoreOp, status: Status) {
        self.faults.lock().push(Fault {
            op,
            rank: None,
            status,
        });
    }

    /// Make the next `op` call from `rank` fail with `status`.
    pub fn inject_failure_on(&self, rank: Rank, op: StoreOp, status: Status) {
        self.faults.lock().push(Fault {
            op,
            rank: Some(rank),
            status,
        });
    }

    fn take_fault(&self, rank: Rank, op: StoreOp) -> StatusResult<()> {
        let mut faults = self.faults.lock();
        let hit = faults
            .iter()
            .position(|f| f.op == op && f.rank.map_or(true, |r| r == rank));
        match hit {
            Some(i) => {
                let fault = faults.remove(i);
                warn!(target: "snapstage::store", rank, op = %op, status = %fault.status, "Injected store failure");
                Err(fault.status)
            }
            None => Ok(()),
        }
    }

    fn record(&self, rank: Rank, op: StoreOp, key: &str, version: Option<Version>) {
        self.journal.lock().push(StoreEvent {
            rank,
            op,
            key: key.to_string(),
            version,
        });
    }

    /// Every successful mutating call so far, in completion order.
    pub fn journal(&self) -> Vec<StoreEvent> {
        self.journal.lock().clone()
    }

    /// Journal entries for one operation.
    pub fn events(&self, op: StoreOp) -> Vec<StoreEvent> {
        self.journal
            .lock()
            .iter()
            .filter(|e| e.op == op)
            .cloned()
            .collect()
    }

    // ========================================================================
    // Store operations (called through MemoryClient)
    // ========================================================================

    pub(crate) fn define_gdim(&self, rank: Rank, name: &str, shape: &[u64]) -> StatusResult<()> {
        self.take_fault(rank, StoreOp::DefineGdim)?;
        if shape.is_empty() {
            return Err(Status::INVALID_ARGUMENT);
        }
        self.shapes.insert(name.to_string(), shape.to_vec());
        self.record(rank, StoreOp::DefineGdim, name, None);
        Ok(())
    }

    pub(crate) fn put(
        &self,
        rank: Rank,
        name: &str,
        version: Version,
        elem_size: usize,
        lb: &[u64],
        ub: &[u64],
        data: &[u8],
    ) -> StatusResult<()> {
        self.take_fault(rank, StoreOp::Put)?;
        let region = Region::new(lb, ub)?;
        if elem_size == 0 {
            return Err(Status::INVALID_ARGUMENT);
        }
        let expected = region
            .volume()
            .and_then(|v| v.checked_mul(elem_size as u64))
            .ok_or(Status::INVALID_ARGUMENT)?;
        if data.len() as u64 != expected {
            return Err(Status::INVALID_ARGUMENT);
        }
        if let Some(shape) = self.shape(name) {
            if !region.fits(&shape) {
                return Err(Status::OUT_OF_BOUNDS);
            }
        }

        {
            let mut entry = self
                .arrays
                .entry((name.to_string(), version))
                .or_insert_with(|| ArrayVersion {
                    elem_size,
                    blocks: Vec::new(),
                });
            if entry.elem_size != elem_size {
                return Err(Status::INVALID_ARGUMENT);
            }
            entry.blocks.retain(|b| b.region != region);
            entry.blocks.push(Block {
                region,
                data: data.to_vec(),
            });
        }

        debug!(target: "snapstage::store", rank, name, version, bytes = data.len(), "Array region stored");
        self.record(rank, StoreOp::Put, name, Some(version));
        Ok(())
    }

    pub(crate) fn get(
        &self,
        rank: Rank,
        name: &str,
        version: Version,
        elem_size: usize,
        lb: &[u64],
        ub: &[u64],
    ) -> StatusResult<Vec<u8>> {
        self.take_fault(rank, StoreOp::Get)?;
        self.read_array(name, version, elem_size, lb, ub)
    }

    /// Read a region without a connection, as an out-of-band reader would.
    ///
    /// Fails with `NOT_FOUND` unless every requested cell has been written.
    pub fn read_array(
        &self,
        name: &str,
        version: Version,
        elem_size: usize,
        lb: &[u64],
        ub: &[u64],
    ) -> StatusResult<Vec<u8>> {
        let wanted = Region::new(lb, ub)?;
        let array = self
            .arrays
            .get(&(name.to_string(), version))
            .ok_or(Status::NOT_FOUND)?;
        if array.elem_size != elem_size {
            return Err(Status::INVALID_ARGUMENT);
        }
        let cells = wanted.volume().ok_or(Status::INVALID_ARGUMENT)?;
        // Stored cells inside the request, counted per block. Fewer than
        // requested means a gap, so the region is refused before allocating.
        let stored = array
            .blocks
            .iter()
            .filter_map(|b| wanted.intersect(&b.region))
            .filter_map(|o| o.volume())
            .fold(0u64, u64::saturating_add);
        if stored < cells {
            return Err(Status::NOT_FOUND);
        }
        let cells = usize::try_from(cells).map_err(|_| Status::INVALID_ARGUMENT)?;
        let mut out = vec![0u8; cells * elem_size];
        let mut covered = vec![false; cells];

        for block in &array.blocks {
            let overlap = match wanted.intersect(&block.region) {
                Some(o) => o,
                None => continue,
            };
            let run = overlap.extent(0) as usize;
            overlap.for_each_run(|idx| {
                let dst = wanted.linear(idx);
                let src = block.region.linear(idx);
                out[dst * elem_size..(dst + run) * elem_size]
                    .copy_from_slice(&block.data[src * elem_size..(src + run) * elem_size]);
                covered[dst..dst + run].fill(true);
            });
        }

        if covered.iter().any(|c| !c) {
            return Err(Status::NOT_FOUND);
        }
        Ok(out)
    }

    /// Read a metadata entry without a connection.
    pub fn read_meta(&self, key: &str, version: Version) -> Option<Vec<u8>> {
        self.meta
            .get(&(key.to_string(), version))
            .map(|p| p.value().clone())
    }

    /// Declared global shape of `name`, without a connection.
    pub fn shape(&self, name: &str) -> Option<Vec<u64>> {
        self.shapes.get(name).map(|s| s.value().clone())
    }

    pub(crate) fn put_meta(
        &self,
        rank: Rank,
        key: &str,
        version: Version,
        payload: &[u8],
    ) -> StatusResult<()> {
        self.take_fault(rank, StoreOp::PutMeta)?;
        self.meta
            .insert((key.to_string(), version), payload.to_vec());
        debug!(target: "snapstage::store", rank, key, version, bytes = payload.len(), "Metadata stored");
        self.record(rank, StoreOp::PutMeta, key, Some(version));
        Ok(())
    }

    pub(crate) fn get_meta(
        &self,
        rank: Rank,
        key: &str,
        version: Version,
    ) -> StatusResult<Option<Vec<u8>>> {
        self.take_fault(rank, StoreOp::GetMeta)?;
        Ok(self.read_meta(key, version))
    }
}

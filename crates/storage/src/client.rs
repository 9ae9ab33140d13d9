//! Per-process connection handle

use snapstage_core::{Rank, StagingClient, Status, StatusResult, Version};
use std::sync::Arc;

use crate::store::MemoryStore;

/// One rank's connection to a [`MemoryStore`]
///
/// Created by the collective [`MemoryStore::connect`]. The connection is
/// released exactly once: by [`StagingClient::finalize`] or, failing that,
/// when the handle is dropped. Calls after release fail with
/// [`Status::NOT_CONNECTED`].
#[derive(Debug)]
pub struct MemoryClient {
    store: Arc<MemoryStore>,
    rank: Rank,
    open: bool,
}

impl MemoryClient {
    pub(crate) fn new(store: Arc<MemoryStore>, rank: Rank) -> Self {
        Self {
            store,
            rank,
            open: true,
        }
    }

    /// Rank this handle was connected from.
    pub fn rank(&self) -> Rank {
        self.rank
    }

    /// The store behind this handle.
    pub fn store(&self) -> &Arc<MemoryStore> {
        &self.store
    }

    fn ensure_open(&self) -> StatusResult<()> {
        if self.open {
            Ok(())
        } else {
            Err(Status::NOT_CONNECTED)
        }
    }
}

impl StagingClient for MemoryClient {
    fn define_gdim(&self, name: &str, shape: &[u64]) -> StatusResult<()> {
        self.ensure_open()?;
        self.store.define_gdim(self.rank, name, shape)
    }

    fn put(
        &self,
        name: &str,
        version: Version,
        elem_size: usize,
        lb: &[u64],
        ub: &[u64],
        data: &[u8],
    ) -> StatusResult<()> {
        self.ensure_open()?;
        self.store
            .put(self.rank, name, version, elem_size, lb, ub, data)
    }

    fn put_meta(&self, key: &str, version: Version, payload: &[u8]) -> StatusResult<()> {
        self.ensure_open()?;
        self.store.put_meta(self.rank, key, version, payload)
    }

    fn get(
        &self,
        name: &str,
        version: Version,
        elem_size: usize,
        lb: &[u64],
        ub: &[u64],
    ) -> StatusResult<Vec<u8>> {
        self.ensure_open()?;
        self.store.get(self.rank, name, version, elem_size, lb, ub)
    }

    fn get_meta(&self, key: &str, version: Version) -> StatusResult<Option<Vec<u8>>> {
        self.ensure_open()?;
        self.store.get_meta(self.rank, key, version)
    }

    fn gdim(&self, name: &str) -> StatusResult<Option<Vec<u64>>> {
        self.ensure_open()?;
        Ok(self.store.shape(name))
    }

    fn finalize(&mut self) -> StatusResult<()> {
        if !self.open {
            return Ok(());
        }
        self.open = false;
        self.store.unregister(self.rank)
    }
}

impl Drop for MemoryClient {
    fn drop(&mut self) {
        // Errors cannot surface from drop; an explicit finalize reports them.
        let _ = self.finalize();
    }
}

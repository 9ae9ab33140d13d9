//! Dump stage lifecycle
//!
//! A [`DumpStage`] owns one process's connection and group handle for the
//! life of a run: schema metadata once at [`DumpStage::init`], one
//! [`DumpStage::write`] per snapshot, and [`DumpStage::finalize`] at shutdown.
//!
//! Every error is fatal for this process. The stage logs it, drops its group
//! handle so peers blocked in a collective see the member leave, and refuses
//! all further writes with [`StageError::Poisoned`]. Nothing is retried.

use snapstage_core::{
    BoxGeometry, Communicator, StageError, StageResult, StagingClient, StoreOp, Version,
};
use tracing::{error, info};

use crate::config::{DumpConfig, GeometryPolicy};
use crate::role::Role;
use crate::schema::{ColumnSchema, SchemaMetadataPublisher};
use crate::snapshot::{RecordSource, SnapshotPublisher, SnapshotReport};

/// One process's publication pipeline for a dump
pub struct DumpStage<C: StagingClient, G: Communicator> {
    config: DumpConfig,
    client: C,
    comm: Option<G>,
    role: Role,
    schema: ColumnSchema,
    snapshots: SnapshotPublisher,
    metadata: SchemaMetadataPublisher,
    geometry: Option<BoxGeometry>,
    poisoned: bool,
}

impl<C: StagingClient, G: Communicator> DumpStage<C, G> {
    /// Build a stage from a connected client and this process's group handle.
    ///
    /// `default_columns` gives one default label per field; user overrides
    /// from the config are merged over it.
    pub fn new<S: AsRef<str>>(
        config: DumpConfig,
        client: C,
        comm: G,
        default_columns: &[S],
    ) -> StageResult<Self> {
        config.validate()?;
        let role = Role::resolve(&comm, config.leader_rank)?;
        let schema = ColumnSchema::assemble(default_columns, &config.column_overrides());
        let snapshots = SnapshotPublisher::new(
            config.dataset_name(),
            schema.len(),
            config.meta_keys.natoms.clone(),
            role,
            config.limits(),
        )?;
        let metadata =
            SchemaMetadataPublisher::new(role, config.meta_keys.clone(), config.id.clone());

        Ok(Self {
            config,
            client,
            comm: Some(comm),
            role,
            schema,
            snapshots,
            metadata,
            geometry: None,
            poisoned: false,
        })
    }

    /// Dump configuration.
    pub fn config(&self) -> &DumpConfig {
        &self.config
    }

    /// Assembled column schema.
    pub fn schema(&self) -> &ColumnSchema {
        &self.schema
    }

    /// This process's role.
    pub fn role(&self) -> Role {
        self.role
    }

    /// The staging client.
    pub fn client(&self) -> &C {
        &self.client
    }

    /// The group handle, `None` once the stage is poisoned.
    pub fn comm(&self) -> Option<&G> {
        self.comm.as_ref()
    }

    /// True once [`DumpStage::init`] has succeeded.
    pub fn is_initialized(&self) -> bool {
        self.geometry.is_some()
    }

    /// True after a fatal error.
    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    /// Publish schema metadata from the leader. Later calls are no-ops.
    pub fn init(&mut self, geometry: BoxGeometry) -> StageResult<()> {
        if self.poisoned {
            return Err(StageError::Poisoned);
        }
        if self.geometry.is_some() {
            return Ok(());
        }
        let result = self
            .metadata
            .publish(&self.client, &self.schema, &geometry);
        self.check(result, 0)?;
        self.geometry = Some(geometry);

        info!(
            target: "snapstage::publish",
            rank = self.role.rank(),
            dump = %self.config.id,
            dataset = %self.snapshots.dataset(),
            fields = self.schema.len(),
            leader = self.role.is_leader(),
            "Dump stage initialized"
        );
        Ok(())
    }

    /// Collective: publish snapshot `version` from `source`.
    pub fn write<S: RecordSource + ?Sized>(
        &mut self,
        version: Version,
        source: &mut S,
    ) -> StageResult<SnapshotReport> {
        if self.poisoned {
            return Err(StageError::Poisoned);
        }
        let geometry = match self.geometry {
            Some(g) => g,
            None => {
                return Err(StageError::InvalidArgument(
                    "write called before init".to_string(),
                ))
            }
        };

        let comm = match self.comm.as_ref() {
            Some(comm) => comm,
            None => return Err(StageError::Poisoned),
        };
        let result = self.snapshots.publish(&self.client, comm, version, source);
        let report = self.check(result, version)?;

        if self.config.geometry == GeometryPolicy::PerSnapshot {
            let current = source.box_geometry().unwrap_or(geometry);
            let result = self
                .metadata
                .publish_geometry(&self.client, version, &current);
            self.check(result, version)?;
            self.geometry = Some(current);
        }
        Ok(report)
    }

    /// Release the store connection.
    pub fn finalize(mut self) -> StageResult<()> {
        self.client
            .finalize()
            .map_err(|status| StageError::store(StoreOp::Finalize, &self.config.id, 0, status))?;
        info!(target: "snapstage::publish", rank = self.role.rank(), dump = %self.config.id, "Dump stage finalized");
        Ok(())
    }

    fn check<T>(&mut self, result: StageResult<T>, version: Version) -> StageResult<T> {
        result.map_err(|e| {
            self.poisoned = true;
            self.comm = None;
            error!(
                target: "snapstage::publish",
                rank = self.role.rank(),
                dump = %self.config.id,
                version,
                status = ?e.status().map(|s| s.code()),
                error = %e,
                "Fatal error, stopping publication on this process"
            );
            e
        })
    }
}

//! Column schema and one-time metadata publication
//!
//! The leader publishes, at version 0 and in this order: the byte length of
//! the column string, the column string, the column count, and the box
//! geometry record under the dump id. Readers discover the array layout from
//! these well-known keys before reading any snapshot.

use snapstage_core::codec::encode_i32;
use snapstage_core::{
    BoxGeometry, StageError, StageResult, StagingClient, StoreOp, Version,
};
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::config::MetaKeys;
use crate::role::Role;

/// Version at which static schema metadata lives.
pub const SCHEMA_VERSION: Version = 0;

/// Ordered field labels of the published array
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSchema {
    labels: Vec<String>,
}

impl ColumnSchema {
    /// Merge user labels over defaults.
    ///
    /// A non-empty override at position `i` replaces default `i`; every other
    /// position keeps its default. Overrides past the last default are ignored.
    pub fn assemble<S: AsRef<str>>(defaults: &[S], overrides: &BTreeMap<usize, String>) -> Self {
        let labels = defaults
            .iter()
            .enumerate()
            .map(|(i, default)| match overrides.get(&i) {
                Some(label) if !label.is_empty() => label.clone(),
                _ => default.as_ref().to_string(),
            })
            .collect();
        Self { labels }
    }

    /// Like [`ColumnSchema::assemble`], with defaults given as one
    /// whitespace-separated string.
    pub fn from_default_string(defaults: &str, overrides: &BTreeMap<usize, String>) -> Self {
        let defaults: Vec<&str> = defaults.split_whitespace().collect();
        Self::assemble(&defaults, overrides)
    }

    /// Labels in field order.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// True when there are no fields.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Space-joined labels, as published.
    pub fn joined(&self) -> String {
        self.labels.join(" ")
    }
}

/// Publishes static schema metadata from the leader
#[derive(Debug, Clone)]
pub struct SchemaMetadataPublisher {
    role: Role,
    keys: MetaKeys,
    geometry_key: String,
}

impl SchemaMetadataPublisher {
    /// Publisher for this process's `role`; geometry goes under `geometry_key`.
    pub fn new(role: Role, keys: MetaKeys, geometry_key: impl Into<String>) -> Self {
        Self {
            role,
            keys,
            geometry_key: geometry_key.into(),
        }
    }

    /// Publish schema and geometry at version 0.
    ///
    /// Returns `false` without touching the store on non-leaders.
    pub fn publish<C: StagingClient + ?Sized>(
        &self,
        client: &C,
        schema: &ColumnSchema,
        geometry: &BoxGeometry,
    ) -> StageResult<bool> {
        if !self.role.is_leader() {
            debug!(target: "snapstage::schema", rank = self.role.rank(), "Not leader, skipping schema metadata");
            return Ok(false);
        }

        let columns = schema.joined();
        let columns_len = i32::try_from(columns.len()).map_err(|_| {
            StageError::InvalidArgument(format!("column string of {} bytes", columns.len()))
        })?;
        let ncolumns = i32::try_from(schema.len()).map_err(|_| {
            StageError::InvalidArgument(format!("{} columns", schema.len()))
        })?;

        self.put(client, &self.keys.column_names_size, SCHEMA_VERSION, &encode_i32(columns_len))?;
        self.put(client, &self.keys.column_names, SCHEMA_VERSION, columns.as_bytes())?;
        self.put(client, &self.keys.ncolumns, SCHEMA_VERSION, &encode_i32(ncolumns))?;
        self.publish_geometry(client, SCHEMA_VERSION, geometry)?;

        info!(target: "snapstage::schema", columns = %columns, ncolumns, triclinic = geometry.is_triclinic(), "Schema metadata published");
        Ok(true)
    }

    /// Publish the geometry record at `version` (leader only).
    pub fn publish_geometry<C: StagingClient + ?Sized>(
        &self,
        client: &C,
        version: Version,
        geometry: &BoxGeometry,
    ) -> StageResult<bool> {
        if !self.role.is_leader() {
            return Ok(false);
        }
        self.put(client, &self.geometry_key, version, &geometry.encode())?;
        Ok(true)
    }

    fn put<C: StagingClient + ?Sized>(
        &self,
        client: &C,
        key: &str,
        version: Version,
        payload: &[u8],
    ) -> StageResult<()> {
        client
            .put_meta(key, version, payload)
            .map_err(|status| StageError::store(StoreOp::PutMeta, key, version, status))
    }
}

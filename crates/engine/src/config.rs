//! Dump configuration via TOML
//!
//! A front end turns user directives into a [`DumpConfig`], either built in
//! code or read from a TOML file.
//!
//! # Example
//!
//! ```toml
//! id = "atoms"
//! dataset = "atoms.%"
//! leader_rank = 0
//! geometry = "once"
//!
//! [[column]]
//! index = 1
//! label = "Y"
//! ```

use serde::{Deserialize, Serialize};
use snapstage_core::{Limits, Rank, StageError, StageResult};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use crate::role::DEFAULT_LEADER_RANK;

/// When the box geometry record is published
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeometryPolicy {
    /// Once at initialization, version 0 (box assumed static)
    #[default]
    Once,
    /// At initialization and again with every snapshot, at the snapshot version
    PerSnapshot,
}

/// Well-known metadata keys
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetaKeys {
    /// Per-snapshot global record count
    pub natoms: String,
    /// Byte length of the column string
    pub column_names_size: String,
    /// Space-joined column labels
    pub column_names: String,
    /// Number of columns
    pub ncolumns: String,
}

impl Default for MetaKeys {
    fn default() -> Self {
        Self {
            natoms: "natoms".to_string(),
            column_names_size: "column_names_str_size".to_string(),
            column_names: "column_names".to_string(),
            ncolumns: "ncolumns".to_string(),
        }
    }
}

impl MetaKeys {
    fn all(&self) -> [&str; 4] {
        [
            self.natoms.as_str(),
            self.column_names_size.as_str(),
            self.column_names.as_str(),
            self.ncolumns.as_str(),
        ]
    }
}

/// User label for one column position
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnLabel {
    /// Zero-based column position
    pub index: usize,
    /// Label replacing the default at `index`
    pub label: String,
}

fn default_max_local_elements() -> u64 {
    Limits::default().max_local_elements
}

/// Configuration of one dump stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DumpConfig {
    /// Dump id; also the key of the geometry record
    pub id: String,
    /// Array name in the store; defaults to `id`. Every `%` is removed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataset: Option<String>,
    /// Rank that publishes one-time and per-snapshot scalar metadata
    #[serde(default)]
    pub leader_rank: Rank,
    /// Geometry publication policy
    #[serde(default)]
    pub geometry: GeometryPolicy,
    /// Maximum `records x fields` per process
    #[serde(default = "default_max_local_elements")]
    pub max_local_elements: u64,
    /// Column label overrides
    #[serde(default, rename = "column", skip_serializing_if = "Vec::is_empty")]
    pub columns: Vec<ColumnLabel>,
    /// Metadata key names
    #[serde(default)]
    pub meta_keys: MetaKeys,
}

impl DumpConfig {
    /// Config with defaults for everything but the id.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            dataset: None,
            leader_rank: DEFAULT_LEADER_RANK,
            geometry: GeometryPolicy::default(),
            max_local_elements: default_max_local_elements(),
            columns: Vec::new(),
            meta_keys: MetaKeys::default(),
        }
    }

    /// Set the dataset name.
    pub fn with_dataset(mut self, dataset: impl Into<String>) -> Self {
        self.dataset = Some(dataset.into());
        self
    }

    /// Set the geometry policy.
    pub fn with_geometry(mut self, policy: GeometryPolicy) -> Self {
        self.geometry = policy;
        self
    }

    /// Set the leader rank.
    pub fn with_leader(mut self, rank: Rank) -> Self {
        self.leader_rank = rank;
        self
    }

    /// Override the label at column `index`.
    pub fn with_column(mut self, index: usize, label: impl Into<String>) -> Self {
        self.columns.push(ColumnLabel {
            index,
            label: label.into(),
        });
        self
    }

    /// Array name used in the store.
    ///
    /// The store always holds one global artifact per snapshot, so per-process
    /// `%` placeholders are dropped.
    pub fn dataset_name(&self) -> String {
        self.dataset
            .as_deref()
            .unwrap_or(&self.id)
            .chars()
            .filter(|c| *c != '%')
            .collect()
    }

    /// Column overrides by position; later entries win.
    pub fn column_overrides(&self) -> BTreeMap<usize, String> {
        self.columns
            .iter()
            .map(|c| (c.index, c.label.clone()))
            .collect()
    }

    /// Per-process limits.
    pub fn limits(&self) -> Limits {
        Limits {
            max_local_elements: self.max_local_elements,
        }
    }

    /// Check the config for internal consistency.
    pub fn validate(&self) -> StageResult<()> {
        if self.id.trim().is_empty() {
            return Err(StageError::config("dump id must not be empty"));
        }
        if self.dataset_name().trim().is_empty() {
            return Err(StageError::config(format!(
                "dataset name for dump '{}' is empty",
                self.id
            )));
        }
        let keys = self.meta_keys.all();
        if keys.iter().any(|k| k.is_empty()) {
            return Err(StageError::config("metadata keys must not be empty"));
        }
        let mut seen: BTreeSet<&str> = keys.iter().copied().collect();
        if seen.len() != keys.len() || !seen.insert(self.id.as_str()) {
            return Err(StageError::config(
                "metadata keys and dump id must be distinct",
            ));
        }
        if self.max_local_elements == 0 {
            return Err(StageError::config("max_local_elements must be positive"));
        }
        Ok(())
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> StageResult<Self> {
        let config: DumpConfig = toml::from_str(content)
            .map_err(|e| StageError::config(format!("failed to parse dump config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a config file.
    pub fn from_file(path: &Path) -> StageResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            StageError::config(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml_str(&content)
    }

    /// Serialize to TOML and write to `path`.
    pub fn write_to_file(&self, path: &Path) -> StageResult<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| StageError::config(format!("failed to serialize dump config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Commented template with every option at its default.
    pub fn default_toml() -> &'static str {
        r#"# Dump id; the box geometry record is published under this key
id = "dump"

# Array name in the staging store (defaults to id, '%' is removed)
# dataset = "dump.%"

# Rank that publishes metadata (default: 0, the lowest rank)
leader_rank = 0

# Box geometry: "once" (default, at init) or "per_snapshot"
geometry = "once"

# Maximum records x fields per process (default: 2147483647)
# max_local_elements = 2147483647

# Column label overrides
# [[column]]
# index = 1
# label = "Y"

# [meta_keys]
# natoms = "natoms"
# column_names_size = "column_names_str_size"
# column_names = "column_names"
# ncolumns = "ncolumns"
"#
    }
}

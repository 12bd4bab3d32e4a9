use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use dbcore_types::Record;

use crate::error::{StoreError, StoreResult};
use crate::key::RecordKey;

/// What `list` does when one matching record fails to load.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListPolicy {
    /// Fail the whole listing with the first record's error.
    #[default]
    Abort,
    /// Log the failure at `warn` and leave the record out.
    Skip,
}

impl ListPolicy {
    /// Read every key in order, applying this policy to failures.
    ///
    /// A key that vanished since it was enumerated is always skipped.
    pub(crate) fn read_all<F>(
        self,
        keys: &[RecordKey],
        read: F,
    ) -> StoreResult<Vec<Box<dyn Record>>>
    where
        F: Fn(&RecordKey) -> StoreResult<Box<dyn Record>>,
    {
        let mut records = Vec::with_capacity(keys.len());
        for key in keys {
            match read(key) {
                Ok(record) => records.push(record),
                Err(StoreError::NotFound { .. }) => {
                    debug!(%key, "record vanished during list");
                }
                Err(e) => match self {
                    ListPolicy::Abort => return Err(e),
                    ListPolicy::Skip => {
                        warn!(%key, code = e.code(), "skipping unreadable record: {e}");
                    }
                },
            }
        }
        Ok(records)
    }
}

/// Configuration for a record store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Directory holding one file per record. Created on first write.
    pub base_dir: PathBuf,
    /// `fsync` each record before it is renamed into place.
    pub sync_on_write: bool,
    /// Per-record failure handling during `list`.
    pub list_policy: ListPolicy,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("data"),
            sync_on_write: true,
            list_policy: ListPolicy::default(),
        }
    }
}

impl StoreConfig {
    /// Default settings rooted at `base_dir`.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            ..Default::default()
        }
    }

    pub fn with_list_policy(mut self, list_policy: ListPolicy) -> Self {
        self.list_policy = list_policy;
        self
    }

    pub fn with_sync_on_write(mut self, sync_on_write: bool) -> Self {
        self.sync_on_write = sync_on_write;
        self
    }

    /// Parse a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(s: &str) -> StoreResult<Self> {
        toml::from_str(s).map_err(|e| StoreError::Config(e.to_string()))
    }

    /// Load a TOML file.
    pub fn from_toml_file(path: &Path) -> StoreResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| StoreError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }
}

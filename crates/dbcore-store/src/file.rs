//! File-backed record store: one file per record.
//!
//! A record keyed `(type_tag, id)` lives at `<base_dir>/<type_tag>+<id>`.
//! Each file holds exactly one JSON [`Envelope`].
//!
//! Writes go to a temporary file in the same directory which is then renamed
//! over the target, so a reader sees either the old envelope or the new one,
//! never a partial write.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::NamedTempFile;
use tracing::debug;

use dbcore_types::Record;

use crate::config::StoreConfig;
use crate::envelope::Envelope;
use crate::error::{StoreError, StoreResult};
use crate::key::RecordKey;
use crate::registry::TypeRegistry;
use crate::traits::RecordStore;

/// Directory-of-files implementation of [`RecordStore`].
pub struct FileRecordStore {
    config: StoreConfig,
    registry: Arc<TypeRegistry>,
}

impl FileRecordStore {
    /// Create a store over `config.base_dir`.
    ///
    /// Nothing is touched on disk until the first write.
    pub fn new(config: StoreConfig, registry: Arc<TypeRegistry>) -> Self {
        Self { config, registry }
    }

    /// Shorthand for a store with default settings rooted at `base_dir`.
    pub fn open(base_dir: impl Into<PathBuf>, registry: Arc<TypeRegistry>) -> Self {
        Self::new(StoreConfig::new(base_dir), registry)
    }

    pub fn base_dir(&self) -> &Path {
        &self.config.base_dir
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Location of the file for `key`.
    pub fn path_for(&self, key: &RecordKey) -> PathBuf {
        self.config.base_dir.join(key.to_string())
    }

    /// Read and parse the raw envelope for `key` without decoding it.
    pub fn read_envelope(&self, key: &RecordKey) -> StoreResult<Envelope> {
        let bytes = fs::read(self.path_for(key)).map_err(|e| not_found_or_io(key, e))?;
        Envelope::from_bytes(key, &bytes)
    }

    fn ensure_base_dir(&self) -> StoreResult<()> {
        fs::create_dir_all(&self.config.base_dir)?;
        Ok(())
    }

    fn write_atomically(&self, path: &Path, bytes: &[u8]) -> StoreResult<()> {
        let mut tmp = NamedTempFile::new_in(&self.config.base_dir)?;
        tmp.write_all(bytes)?;
        if self.config.sync_on_write {
            tmp.as_file().sync_all()?;
        }
        tmp.persist(path).map_err(|e| StoreError::Io(e.error))?;
        Ok(())
    }
}

impl RecordStore for FileRecordStore {
    fn write(&self, record: &dyn Record) -> StoreResult<RecordKey> {
        let key = RecordKey::of(record)?;
        let bytes = Envelope::wrap(record)?.to_bytes()?;

        self.ensure_base_dir()?;
        let path = self.path_for(&key);
        self.write_atomically(&path, &bytes)?;

        debug!(%key, bytes = bytes.len(), "record written");
        Ok(key)
    }

    fn read(&self, key: &RecordKey) -> StoreResult<Box<dyn Record>> {
        self.read_envelope(key)?.open(key, &self.registry)
    }

    fn delete(&self, key: &RecordKey) -> StoreResult<()> {
        fs::remove_file(self.path_for(key)).map_err(|e| not_found_or_io(key, e))?;
        debug!(%key, "record deleted");
        Ok(())
    }

    fn keys(&self) -> StoreResult<Vec<RecordKey>> {
        let entries = match fs::read_dir(&self.config.base_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut keys = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            // Temp files and anything else not shaped like a key are ignored.
            if let Some(key) = entry.file_name().to_str().and_then(RecordKey::parse) {
                keys.push(key);
            }
        }
        keys.sort();
        Ok(keys)
    }

    fn exists(&self, key: &RecordKey) -> StoreResult<bool> {
        match fs::metadata(self.path_for(key)) {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn list(&self, type_tag: &str) -> StoreResult<Vec<Box<dyn Record>>> {
        let keys = self.list_keys(type_tag)?;
        let records = self.config.list_policy.read_all(&keys, |key| self.read(key))?;
        debug!(type_tag, count = records.len(), "records listed");
        Ok(records)
    }
}

impl std::fmt::Debug for FileRecordStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileRecordStore")
            .field("base_dir", &self.config.base_dir)
            .field("list_policy", &self.config.list_policy)
            .field("registry", &self.registry)
            .finish()
    }
}

fn not_found_or_io(key: &RecordKey, e: io::Error) -> StoreError {
    if e.kind() == io::ErrorKind::NotFound {
        StoreError::NotFound { key: key.clone() }
    } else {
        StoreError::Io(e)
    }
}

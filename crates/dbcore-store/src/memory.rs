use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use dbcore_types::Record;

use crate::config::ListPolicy;
use crate::envelope::Envelope;
use crate::error::{StoreError, StoreResult};
use crate::key::RecordKey;
use crate::registry::TypeRegistry;
use crate::traits::RecordStore;

/// In-memory, HashMap-based record store.
///
/// Intended for tests and embedding. Records are held as envelopes, so every
/// write and read goes through the same encode/decode path as the file
/// store and a type that round-trips here round-trips on disk.
pub struct InMemoryRecordStore {
    envelopes: RwLock<HashMap<RecordKey, Envelope>>,
    registry: Arc<TypeRegistry>,
    list_policy: ListPolicy,
}

impl InMemoryRecordStore {
    /// Create a new empty in-memory store.
    pub fn new(registry: Arc<TypeRegistry>) -> Self {
        Self {
            envelopes: RwLock::new(HashMap::new()),
            registry,
            list_policy: ListPolicy::default(),
        }
    }

    pub fn with_list_policy(mut self, list_policy: ListPolicy) -> Self {
        self.list_policy = list_policy;
        self
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Number of records currently stored.
    pub fn len(&self) -> usize {
        self.envelopes.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.envelopes.read().expect("lock poisoned").is_empty()
    }

    /// Remove all records from the store.
    pub fn clear(&self) {
        self.envelopes.write().expect("lock poisoned").clear();
    }

    /// Store a raw envelope under `key`, bypassing encoding.
    pub fn insert_envelope(&self, key: RecordKey, envelope: Envelope) {
        self.envelopes
            .write()
            .expect("lock poisoned")
            .insert(key, envelope);
    }

    /// The raw envelope stored under `key`.
    pub fn envelope(&self, key: &RecordKey) -> StoreResult<Envelope> {
        self.envelopes
            .read()
            .expect("lock poisoned")
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::NotFound { key: key.clone() })
    }
}

impl RecordStore for InMemoryRecordStore {
    fn write(&self, record: &dyn Record) -> StoreResult<RecordKey> {
        let key = RecordKey::of(record)?;
        let envelope = Envelope::wrap(record)?;
        self.insert_envelope(key.clone(), envelope);
        Ok(key)
    }

    fn read(&self, key: &RecordKey) -> StoreResult<Box<dyn Record>> {
        self.envelope(key)?.open(key, &self.registry)
    }

    fn delete(&self, key: &RecordKey) -> StoreResult<()> {
        let mut map = self.envelopes.write().expect("lock poisoned");
        match map.remove(key) {
            Some(_) => Ok(()),
            None => Err(StoreError::NotFound { key: key.clone() }),
        }
    }

    fn keys(&self) -> StoreResult<Vec<RecordKey>> {
        let map = self.envelopes.read().expect("lock poisoned");
        let mut keys: Vec<RecordKey> = map.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }

    fn exists(&self, key: &RecordKey) -> StoreResult<bool> {
        let map = self.envelopes.read().expect("lock poisoned");
        Ok(map.contains_key(key))
    }

    fn list(&self, type_tag: &str) -> StoreResult<Vec<Box<dyn Record>>> {
        let keys = self.list_keys(type_tag)?;
        self.list_policy.read_all(&keys, |key| self.read(key))
    }
}

impl std::fmt::Debug for InMemoryRecordStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.len();
        f.debug_struct("InMemoryRecordStore")
            .field("record_count", &count)
            .field("list_policy", &self.list_policy)
            .finish()
    }
}

use dbcore_types::{EntityId, Record, RecordType};

use crate::error::{StoreError, StoreResult};
use crate::key::RecordKey;

/// Persistence engine contract.
///
/// All implementations must satisfy these invariants:
/// - `write` overwrites whatever is stored under the record's key. It is
///   idempotent and last-write-wins; there is no concurrency check.
/// - `read` returns the exact concrete type that was written, never a
///   weaker base type.
/// - `read` and `delete` on an absent key fail with `NotFound`.
/// - `list` never fails just because nothing is stored; it returns an empty
///   vector. Order is unspecified.
/// - Soft-deleted records are ordinary records here. Only `delete` removes
///   anything.
/// - Operations are synchronous and take no locks across calls. Callers that
///   need mutual exclusion per key must serialize externally.
pub trait RecordStore: Send + Sync {
    /// Store a record under `(type_tag, id)`, replacing any previous value.
    fn write(&self, record: &dyn Record) -> StoreResult<RecordKey>;

    /// Load and reconstruct the record stored under `key`.
    fn read(&self, key: &RecordKey) -> StoreResult<Box<dyn Record>>;

    /// Remove the record stored under `key`.
    fn delete(&self, key: &RecordKey) -> StoreResult<()>;

    /// Every key currently stored, across all types.
    fn keys(&self) -> StoreResult<Vec<RecordKey>>;

    /// Check whether a record is stored under `key`.
    fn exists(&self, key: &RecordKey) -> StoreResult<bool>;

    /// Every record currently stored under `type_tag`.
    fn list(&self, type_tag: &str) -> StoreResult<Vec<Box<dyn Record>>>;

    /// Keys stored under exactly `type_tag`.
    fn list_keys(&self, type_tag: &str) -> StoreResult<Vec<RecordKey>> {
        crate::key::validate_type_tag(type_tag)?;
        Ok(self
            .keys()?
            .into_iter()
            .filter(|key| key.has_type(type_tag))
            .collect())
    }

    /// Read keyed by a type tag and ID.
    fn read_by_key(&self, type_tag: &str, id: EntityId) -> StoreResult<Box<dyn Record>> {
        self.read(&RecordKey::new(type_tag, id)?)
    }

    /// Read keyed by a record's own type and ID.
    fn read_model(&self, record: &dyn Record) -> StoreResult<Box<dyn Record>> {
        self.read(&RecordKey::of(record)?)
    }

    /// Remove the stored copy of `record`.
    fn delete_model(&self, record: &dyn Record) -> StoreResult<()> {
        self.delete(&RecordKey::of(record)?)
    }
}

/// Typed conveniences over any [`RecordStore`].
pub trait RecordStoreExt: RecordStore {
    /// Write `record` and hand it back.
    fn write_record<R: Record>(&self, record: R) -> StoreResult<R> {
        self.write(&record)?;
        Ok(record)
    }

    /// Physically delete the stored copy of `record` and hand it back
    /// unchanged.
    fn delete_record<R: Record>(&self, record: R) -> StoreResult<R> {
        self.delete_model(&record)?;
        Ok(record)
    }

    /// Read the `T` stored under `id`.
    fn read_as<T: RecordType>(&self, id: EntityId) -> StoreResult<T> {
        let key = RecordKey::new(T::TYPE_TAG, id)?;
        let record = self.read(&key)?;
        expect_type::<T>(&key, record)
    }

    /// Every stored `T`.
    fn list_as<T: RecordType>(&self) -> StoreResult<Vec<T>> {
        self.list(T::TYPE_TAG)?
            .into_iter()
            .map(|record| {
                let key = RecordKey::of(&*record)?;
                expect_type::<T>(&key, record)
            })
            .collect()
    }
}

impl<S: RecordStore + ?Sized> RecordStoreExt for S {}

fn expect_type<T: RecordType>(key: &RecordKey, record: Box<dyn Record>) -> StoreResult<T> {
    record.downcast::<T>().map_err(|other| {
        StoreError::decode(
            key,
            format!(
                "stored record is {}::{}, expected {}::{}",
                other.type_location(),
                other.type_tag(),
                T::TYPE_LOCATION,
                T::TYPE_TAG
            ),
        )
    })
}

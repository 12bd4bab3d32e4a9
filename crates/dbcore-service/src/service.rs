use std::sync::Arc;

use tracing::{debug, info};

use dbcore_store::{RecordStore, RecordStoreExt};
use dbcore_types::{EntityId, Record, RecordType};

use crate::clock::{Clock, SystemClock};
use crate::error::ServiceResult;
use crate::lifecycle;

/// Lifecycle facade over a [`RecordStore`].
///
/// The mutation helpers only touch parent linkage, timestamps and the
/// soft-delete flag. The persisting helpers apply one of them and then write
/// through to the store.
pub struct RecordService {
    store: Arc<dyn RecordStore>,
    clock: Arc<dyn Clock>,
}

impl RecordService {
    /// A service stamping with the system clock.
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    pub fn with_clock(store: Arc<dyn RecordStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub fn store(&self) -> &dyn RecordStore {
        self.store.as_ref()
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    // ---- Mutation helpers ----

    pub fn link_to_parent(&self, child: &mut dyn Record, parent: &dyn Record) {
        lifecycle::link_to_parent(child, parent);
    }

    pub fn unlink_from_parent(&self, child: &mut dyn Record) {
        lifecycle::unlink_from_parent(child);
    }

    pub fn create(&self, record: &mut dyn Record) {
        lifecycle::create(record, self.clock.as_ref());
    }

    pub fn update(&self, record: &mut dyn Record) {
        lifecycle::update(record, self.clock.as_ref());
    }

    pub fn delete(&self, record: &mut dyn Record) {
        lifecycle::delete(record, self.clock.as_ref());
    }

    // ---- Persisting helpers ----

    /// Stamp creation time and write the record.
    pub fn insert<R: Record>(&self, mut record: R) -> ServiceResult<R> {
        self.create(&mut record);
        let key = self.store.write(&record)?;
        info!(%key, "record created");
        Ok(record)
    }

    /// Stamp modification time and write the record.
    pub fn save<R: Record>(&self, mut record: R) -> ServiceResult<R> {
        self.update(&mut record);
        let key = self.store.write(&record)?;
        debug!(%key, "record saved");
        Ok(record)
    }

    /// Mark the record deleted and write it. The record stays readable.
    pub fn soft_delete<R: Record>(&self, mut record: R) -> ServiceResult<R> {
        self.delete(&mut record);
        let key = self.store.write(&record)?;
        info!(%key, "record soft-deleted");
        Ok(record)
    }

    /// Physically remove the stored copy, regardless of its soft-delete flag.
    pub fn purge<R: Record>(&self, record: R) -> ServiceResult<R> {
        let record = self.store.delete_record(record)?;
        info!(type_tag = record.type_tag(), id = %record.id(), "record purged");
        Ok(record)
    }

    /// The `T` stored under `id`, soft-deleted or not.
    pub fn get<T: RecordType>(&self, id: EntityId) -> ServiceResult<T> {
        Ok(self.store.read_as(id)?)
    }

    /// Every stored `T`, including soft-deleted ones.
    pub fn list<T: RecordType>(&self) -> ServiceResult<Vec<T>> {
        Ok(self.store.list_as()?)
    }

    /// Every stored `T` that is not soft-deleted.
    pub fn list_live<T: RecordType>(&self) -> ServiceResult<Vec<T>> {
        let mut records: Vec<T> = self.list()?;
        records.retain(|r| !RecordType::meta(r).is_deleted);
        Ok(records)
    }

    /// Every stored `T` whose parent is `parent_id`.
    pub fn children_of<T: RecordType>(&self, parent_id: EntityId) -> ServiceResult<Vec<T>> {
        let mut records: Vec<T> = self.list()?;
        records.retain(|r| RecordType::meta(r).is_child_of(parent_id));
        Ok(records)
    }
}

impl std::fmt::Debug for RecordService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordService").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use chrono::{Duration, TimeZone, Utc};
    use dbcore_store::{FileRecordStore, InMemoryRecordStore, TypeRegistry};
    use dbcore_types::{record_type, BaseEntity, EntityMeta};
    use serde::{Deserialize, Serialize};

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    struct Folder {
        #[serde(flatten)]
        meta: EntityMeta,
        name: String,
    }

    record_type!(Folder, meta);

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    struct Document {
        #[serde(flatten)]
        meta: EntityMeta,
        title: String,
    }

    record_type!(Document, meta);

    fn registry() -> Arc<TypeRegistry> {
        let mut registry = TypeRegistry::with_base_types();
        registry.register::<Folder>().register::<Document>();
        Arc::new(registry)
    }

    fn service() -> (RecordService, Arc<FixedClock>) {
        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap(),
        ));
        let store = Arc::new(InMemoryRecordStore::new(registry()));
        (RecordService::with_clock(store, clock.clone()), clock)
    }

    fn folder(name: &str) -> Folder {
        Folder {
            meta: EntityMeta::bare(EntityId::new()),
            name: name.into(),
        }
    }

    fn document(title: &str) -> Document {
        Document {
            meta: EntityMeta::bare(EntityId::new()),
            title: title.into(),
        }
    }

    // -----------------------------------------------------------------------
    // Persisting helpers
    // -----------------------------------------------------------------------

    #[test]
    fn insert_stamps_and_writes() {
        let (svc, clock) = service();
        let f = svc.insert(folder("root")).unwrap();
        assert_eq!(f.meta.created_at, Some(clock.now()));
        assert_eq!(f.meta.updated_at, f.meta.created_at);

        let back: Folder = svc.get(f.meta.id).unwrap();
        assert_eq!(back, f);
    }

    #[test]
    fn save_updates_only_updated_at() {
        let (svc, clock) = service();
        let mut f = svc.insert(folder("root")).unwrap();
        let created = f.meta.created_at;

        clock.advance(Duration::hours(1));
        f.name = "renamed".into();
        let f = svc.save(f).unwrap();
        assert_eq!(f.meta.created_at, created);
        assert_eq!(f.meta.updated_at, Some(clock.now()));

        let back: Folder = svc.get(f.meta.id).unwrap();
        assert_eq!(back.name, "renamed");
        assert_eq!(back.meta.updated_at, Some(clock.now()));
    }

    #[test]
    fn soft_delete_keeps_record_readable() {
        let (svc, clock) = service();
        let f = svc.insert(folder("tmp")).unwrap();
        let f = svc.soft_delete(f).unwrap();
        assert!(f.meta.is_deleted);
        assert_eq!(f.meta.deleted_at, Some(clock.now()));

        let back: Folder = svc.get(f.meta.id).unwrap();
        assert!(back.meta.is_deleted);
        assert_eq!(back.meta.deleted_at, Some(clock.now()));
    }

    #[test]
    fn soft_delete_again_restamps() {
        let (svc, clock) = service();
        let f = svc.insert(folder("tmp")).unwrap();
        let f = svc.soft_delete(f).unwrap();

        clock.advance(Duration::minutes(1));
        let f = svc.soft_delete(f).unwrap();
        assert!(f.meta.is_deleted);
        assert_eq!(f.meta.deleted_at, Some(clock.now()));
        assert_eq!(svc.list::<Folder>().unwrap().len(), 1);
    }

    #[test]
    fn purge_removes_without_soft_delete() {
        let (svc, _clock) = service();
        let f = svc.insert(folder("gone")).unwrap();
        let f = svc.purge(f).unwrap();
        assert!(!f.meta.is_deleted);
        assert!(svc.get::<Folder>(f.meta.id).unwrap_err().is_not_found());
    }

    #[test]
    fn purge_missing_is_not_found() {
        let (svc, _clock) = service();
        let err = svc.purge(folder("never-written")).unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.code(), "not_found");
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    #[test]
    fn list_live_hides_soft_deleted() {
        let (svc, _clock) = service();
        let keep = svc.insert(folder("keep")).unwrap();
        let drop = svc.insert(folder("drop")).unwrap();
        svc.soft_delete(drop).unwrap();

        assert_eq!(svc.list::<Folder>().unwrap().len(), 2);
        assert_eq!(svc.list_live::<Folder>().unwrap(), vec![keep]);
    }

    #[test]
    fn children_of_follows_parent_link() {
        let (svc, _clock) = service();
        let parent = svc.insert(folder("parent")).unwrap();

        let mut a = document("a");
        svc.link_to_parent(&mut a, &parent);
        let a = svc.insert(a).unwrap();
        svc.insert(document("orphan")).unwrap();

        let children: Vec<Document> = svc.children_of(parent.meta.id).unwrap();
        assert_eq!(children, vec![a]);
        assert!(svc
            .children_of::<Folder>(parent.meta.id)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn unlink_then_save_detaches() {
        let (svc, _clock) = service();
        let parent = svc.insert(folder("parent")).unwrap();
        let mut doc = document("d");
        svc.link_to_parent(&mut doc, &parent);
        let mut doc = svc.insert(doc).unwrap();

        svc.unlink_from_parent(&mut doc);
        svc.save(doc).unwrap();
        assert!(svc
            .children_of::<Document>(parent.meta.id)
            .unwrap()
            .is_empty());
    }

    // -----------------------------------------------------------------------
    // Backends
    // -----------------------------------------------------------------------

    #[test]
    fn works_over_file_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(FileRecordStore::open(dir.path(), registry()));
        let svc = RecordService::new(store);

        let base = svc.insert(BaseEntity::new()).unwrap();
        let base = svc.soft_delete(base).unwrap();
        let back: BaseEntity = svc.get(base.meta.id).unwrap();
        assert_eq!(back, base);
        assert!(svc.list_live::<BaseEntity>().unwrap().is_empty());

        svc.purge(back).unwrap();
        assert!(svc.list::<BaseEntity>().unwrap().is_empty());
    }

    #[test]
    fn mutation_helpers_do_not_write() {
        let (svc, _clock) = service();
        let mut f = folder("local");
        svc.create(&mut f);
        svc.update(&mut f);
        svc.delete(&mut f);
        assert!(svc.store().keys().unwrap().is_empty());
    }
}

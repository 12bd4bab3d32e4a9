//! Pure mutation helpers over a record's lifecycle fields.
//!
//! None of these touch a store, and none of them change a record's ID.

use dbcore_types::Record;

use crate::clock::Clock;

/// Point `child` at `parent`. The parent is not looked up or validated.
pub fn link_to_parent(child: &mut dyn Record, parent: &dyn Record) {
    child.meta_mut().parent_id = Some(parent.id());
}

pub fn unlink_from_parent(child: &mut dyn Record) {
    child.meta_mut().parent_id = None;
}

/// Stamp both `created_at` and `updated_at` with a single reading of `clock`.
pub fn create(record: &mut dyn Record, clock: &dyn Clock) {
    let now = clock.now();
    let meta = record.meta_mut();
    meta.created_at = Some(now);
    meta.updated_at = Some(now);
}

/// Stamp `updated_at` only.
pub fn update(record: &mut dyn Record, clock: &dyn Clock) {
    record.meta_mut().updated_at = Some(clock.now());
}

/// Mark the record soft-deleted. Nothing is removed from any store.
pub fn delete(record: &mut dyn Record, clock: &dyn Clock) {
    let meta = record.meta_mut();
    meta.deleted_at = Some(clock.now());
    meta.is_deleted = true;
}

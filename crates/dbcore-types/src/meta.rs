use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::EntityId;
use crate::timestamp;

/// Identity and lifecycle fields carried by every persisted record.
///
/// Concrete record types embed this with `#[serde(flatten)]`, so the fields
/// sit at the top level of the record's attribute payload.
///
/// - `id` is assigned once at construction and never changes.
/// - `parent_id` is a soft back-reference; the parent is never loaded or
///   validated.
/// - Soft deletion only sets `is_deleted` and `deleted_at`. Physical removal
///   is a separate store operation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityMeta {
    #[serde(rename = "uuid")]
    pub id: EntityId,

    #[serde(rename = "parent_uuid", default)]
    pub parent_id: Option<EntityId>,

    #[serde(default, with = "timestamp::option")]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default, with = "timestamp::option")]
    pub updated_at: Option<DateTime<Utc>>,

    #[serde(default, with = "timestamp::option")]
    pub deleted_at: Option<DateTime<Utc>>,

    #[serde(default, deserialize_with = "timestamp::nullable_bool")]
    pub is_deleted: bool,
}

impl EntityMeta {
    /// Fresh metadata: new ID, `created_at == updated_at == now`.
    pub fn new() -> Self {
        Self::stamped(EntityId::new(), Utc::now())
    }

    /// Metadata for an explicit ID, stamped at `now`.
    pub fn stamped(id: EntityId, now: DateTime<Utc>) -> Self {
        Self {
            id,
            parent_id: None,
            created_at: Some(now),
            updated_at: Some(now),
            deleted_at: None,
            is_deleted: false,
        }
    }

    /// Metadata with only the ID set; every lifecycle field is empty.
    pub fn bare(id: EntityId) -> Self {
        Self {
            id,
            parent_id: None,
            created_at: None,
            updated_at: None,
            deleted_at: None,
            is_deleted: false,
        }
    }

    /// Returns `true` if this entity points at `parent`.
    pub fn is_child_of(&self, parent: EntityId) -> bool {
        self.parent_id == Some(parent)
    }

    /// Returns `true` if `is_deleted` is set.
    pub fn is_soft_deleted(&self) -> bool {
        self.is_deleted
    }
}

impl Default for EntityMeta {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn new_stamps_both_timestamps_equal() {
        let meta = EntityMeta::new();
        assert!(meta.created_at.is_some());
        assert_eq!(meta.created_at, meta.updated_at);
        assert!(meta.deleted_at.is_none());
        assert!(!meta.is_deleted);
        assert!(meta.parent_id.is_none());
    }

    #[test]
    fn wire_field_names() {
        let meta = EntityMeta::bare(EntityId::nil());
        let value = serde_json::to_value(&meta).unwrap();
        let obj = value.as_object().unwrap();
        assert!(obj.contains_key("uuid"));
        assert!(obj.contains_key("parent_uuid"));
        assert!(obj.contains_key("created_at"));
        assert!(obj.contains_key("updated_at"));
        assert!(obj.contains_key("deleted_at"));
        assert!(obj.contains_key("is_deleted"));
        assert!(!obj.contains_key("id"));
    }

    #[test]
    fn decodes_partial_record() {
        let meta: EntityMeta = serde_json::from_value(json!({
            "uuid": "00000000-0000-0000-0000-000000000000",
        }))
        .unwrap();
        assert!(meta.id.is_nil());
        assert!(meta.created_at.is_none());
        assert!(!meta.is_deleted);
    }

    #[test]
    fn decodes_null_is_deleted_as_false() {
        let meta: EntityMeta = serde_json::from_value(json!({
            "uuid": "00000000-0000-0000-0000-000000000000",
            "is_deleted": null,
        }))
        .unwrap();
        assert!(!meta.is_deleted);
    }

    #[test]
    fn decodes_naive_timestamps() {
        let meta: EntityMeta = serde_json::from_value(json!({
            "uuid": "00000000-0000-0000-0000-000000000000",
            "parent_uuid": null,
            "created_at": "2024-05-01T09:30:00.250000",
            "updated_at": "2024-05-01T09:30:00.250000Z",
            "deleted_at": null,
            "is_deleted": false,
        }))
        .unwrap();
        assert_eq!(meta.created_at, meta.updated_at);
    }

    #[test]
    fn missing_uuid_is_rejected() {
        let result: Result<EntityMeta, _> = serde_json::from_value(json!({ "is_deleted": true }));
        assert!(result.is_err());
    }

    #[test]
    fn json_roundtrip_preserves_all_fields() {
        let mut meta = EntityMeta::new();
        meta.parent_id = Some(EntityId::new());
        meta.deleted_at = Some(Utc::now());
        meta.is_deleted = true;
        let json = serde_json::to_string(&meta).unwrap();
        let back: EntityMeta = serde_json::from_str(&json).unwrap();
        assert_eq!(meta, back);
    }

    #[test]
    fn is_child_of() {
        let parent = EntityId::new();
        let mut meta = EntityMeta::new();
        assert!(!meta.is_child_of(parent));
        meta.parent_id = Some(parent);
        assert!(meta.is_child_of(parent));
    }
}

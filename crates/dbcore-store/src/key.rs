use std::fmt;

use dbcore_types::{EntityId, Record};

use crate::error::{StoreError, StoreResult};

/// Separator between the type tag and the ID in a storage key.
pub const SEPARATOR: char = '+';

/// Storage address of a record: `(type_tag, id)`.
///
/// Renders as `<type_tag>+<id>`, which is also the record's file name in the
/// file backend. Type tags are restricted to ASCII alphanumerics, `_` and `-`
/// so that a key can never contain the separator or a path component.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordKey {
    type_tag: String,
    id: EntityId,
}

impl RecordKey {
    /// Build a key, validating the type tag.
    pub fn new(type_tag: impl Into<String>, id: EntityId) -> StoreResult<Self> {
        let type_tag = type_tag.into();
        validate_type_tag(&type_tag)?;
        Ok(Self { type_tag, id })
    }

    /// The key a record is stored under.
    pub fn of(record: &dyn Record) -> StoreResult<Self> {
        Self::new(record.type_tag(), record.id())
    }

    /// Parse a rendered key (file name). Returns `None` for anything that is
    /// not exactly `<valid tag>+<uuid>`.
    pub fn parse(s: &str) -> Option<Self> {
        let (type_tag, id) = s.split_once(SEPARATOR)?;
        let id = id.parse().ok()?;
        Self::new(type_tag, id).ok()
    }

    pub fn type_tag(&self) -> &str {
        &self.type_tag
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Returns `true` if this key belongs to `type_tag` exactly.
    ///
    /// `"User"` does not match a key under `"UserProfile"`.
    pub fn has_type(&self, type_tag: &str) -> bool {
        self.type_tag == type_tag
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.type_tag, SEPARATOR, self.id)
    }
}

/// Check that a type tag can be used as a storage key component.
pub fn validate_type_tag(type_tag: &str) -> StoreResult<()> {
    if type_tag.is_empty() {
        return Err(StoreError::InvalidKey {
            reason: "type tag is empty".into(),
        });
    }
    if let Some(bad) = type_tag
        .chars()
        .find(|c| !(c.is_alphanumeric() || *c == '_' || *c == '-'))
    {
        return Err(StoreError::InvalidKey {
            reason: format!("type tag {type_tag:?} contains {bad:?}"),
        });
    }
    Ok(())
}

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use dbcore_types::Record;

use crate::error::{StoreError, StoreResult};
use crate::key::RecordKey;
use crate::registry::TypeRegistry;

/// Wire name of the type tag field.
pub const TYPE_TAG_FIELD: &str = "__class__";
/// Wire name of the type location field.
pub const TYPE_LOCATION_FIELD: &str = "__module__";
/// Wire name of the attribute payload field.
pub const ATTRIBUTES_FIELD: &str = "__attributes__";

/// The unit of durability: one envelope per stored record.
///
/// On disk this is a JSON object with exactly three string fields. The
/// attribute payload is itself the JSON text of the record and is opaque to
/// the envelope.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Concrete type name of the record.
    #[serde(rename = "__class__")]
    pub type_tag: String,
    /// Where the type is defined; resolved together with `type_tag`.
    #[serde(rename = "__module__")]
    pub type_location: String,
    /// The record's full field set, serialized.
    #[serde(rename = "__attributes__")]
    pub attributes: String,
}

impl Envelope {
    /// Wrap a record for storage.
    pub fn wrap(record: &dyn Record) -> StoreResult<Self> {
        let attributes = record
            .to_attributes()
            .map_err(|e| StoreError::Encode(e.to_string()))?;
        Ok(Self {
            type_tag: record.type_tag().to_string(),
            type_location: record.type_location().to_string(),
            attributes,
        })
    }

    /// Serialize the envelope itself.
    pub fn to_bytes(&self) -> StoreResult<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| StoreError::Encode(e.to_string()))
    }

    /// Parse an envelope read from `key`'s location.
    ///
    /// Empty or malformed bytes are a `Decode` error; a well-formed object
    /// lacking one of the three fields is a `MissingField` error.
    pub fn from_bytes(key: &RecordKey, bytes: &[u8]) -> StoreResult<Self> {
        let value: Value =
            serde_json::from_slice(bytes).map_err(|e| StoreError::decode(key, e.to_string()))?;
        let Value::Object(mut fields) = value else {
            return Err(StoreError::decode(key, "envelope is not a JSON object"));
        };
        Ok(Self {
            type_tag: take_string(key, &mut fields, TYPE_TAG_FIELD)?,
            type_location: take_string(key, &mut fields, TYPE_LOCATION_FIELD)?,
            attributes: take_string(key, &mut fields, ATTRIBUTES_FIELD)?,
        })
    }

    /// Reconstruct the concrete record this envelope holds.
    ///
    /// The envelope's stored type tag and the decoded record's ID must match
    /// `key`; anything else means the file was written under the wrong name.
    /// The decoded record's own tag may differ when the stored name is a
    /// registry alias.
    pub fn open(&self, key: &RecordKey, registry: &TypeRegistry) -> StoreResult<Box<dyn Record>> {
        let decoder = registry.resolve(&self.type_location, &self.type_tag)?;
        let record = decoder(&self.attributes).map_err(|e| StoreError::decode(key, e.to_string()))?;
        if !key.has_type(&self.type_tag) || record.id() != key.id() {
            return Err(StoreError::decode(
                key,
                format!(
                    "envelope does not match key: holds {}+{}",
                    self.type_tag,
                    record.id()
                ),
            ));
        }
        Ok(record)
    }
}

fn take_string(
    key: &RecordKey,
    fields: &mut Map<String, Value>,
    field: &'static str,
) -> StoreResult<String> {
    match fields.remove(field) {
        None => Err(StoreError::MissingField {
            key: key.clone(),
            field,
        }),
        Some(Value::String(s)) => Ok(s),
        Some(other) => Err(StoreError::decode(
            key,
            format!("field `{field}` must be a string, got {other}"),
        )),
    }
}

//! The polymorphic record contract.
//!
//! A store holds many concrete record types behind one abstract interface and
//! must hand back the exact concrete type on read. Concrete types implement
//! [`RecordType`] (usually through [`record_type!`](crate::record_type)); the
//! object-safe [`Record`] view is blanket-implemented for all of them.

use std::any::Any;
use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::id::EntityId;
use crate::meta::EntityMeta;

/// A concrete, serializable record type with a stable name and origin.
///
/// `TYPE_TAG` and `TYPE_LOCATION` are what get written into the stored
/// envelope, and together they are the key a type registry resolves on read.
pub trait RecordType:
    Serialize + DeserializeOwned + Clone + PartialEq + fmt::Debug + Send + Sync + 'static
{
    /// The type's name, used as the first component of its storage key.
    const TYPE_TAG: &'static str;

    /// Fully-qualified origin of the type (module path).
    const TYPE_LOCATION: &'static str;

    /// The embedded identity and lifecycle fields.
    fn meta(&self) -> &EntityMeta;

    /// Mutable access to the embedded identity and lifecycle fields.
    fn meta_mut(&mut self) -> &mut EntityMeta;

    /// Decode a value of this type from its attribute payload.
    fn from_attributes(attributes: &str) -> Result<Self, TypeError> {
        serde_json::from_str(attributes).map_err(|e| TypeError::Serialization(e.to_string()))
    }
}

/// Object-safe view over any [`RecordType`].
pub trait Record: fmt::Debug + Send + Sync + Any {
    fn type_tag(&self) -> &'static str;

    fn type_location(&self) -> &'static str;

    fn meta(&self) -> &EntityMeta;

    fn meta_mut(&mut self) -> &mut EntityMeta;

    /// Serialize the full field set into an attribute payload.
    fn to_attributes(&self) -> Result<String, TypeError>;

    fn as_any(&self) -> &dyn Any;

    fn into_any(self: Box<Self>) -> Box<dyn Any>;

    fn clone_record(&self) -> Box<dyn Record>;

    /// Deep equality: same concrete type and equal in every field.
    fn eq_record(&self, other: &dyn Record) -> bool;

    fn id(&self) -> EntityId {
        self.meta().id
    }
}

impl<T: RecordType> Record for T {
    fn type_tag(&self) -> &'static str {
        T::TYPE_TAG
    }

    fn type_location(&self) -> &'static str {
        T::TYPE_LOCATION
    }

    fn meta(&self) -> &EntityMeta {
        RecordType::meta(self)
    }

    fn meta_mut(&mut self) -> &mut EntityMeta {
        RecordType::meta_mut(self)
    }

    fn to_attributes(&self) -> Result<String, TypeError> {
        serde_json::to_string(self).map_err(|e| TypeError::Serialization(e.to_string()))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }

    fn clone_record(&self) -> Box<dyn Record> {
        Box::new(self.clone())
    }

    fn eq_record(&self, other: &dyn Record) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .is_some_and(|other| self == other)
    }
}

impl dyn Record {
    /// Borrow as the concrete type `T`, if that is what this record is.
    pub fn downcast_ref<T: RecordType>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    /// Returns `true` if this record is a `T`.
    pub fn is<T: RecordType>(&self) -> bool {
        self.as_any().is::<T>()
    }

    /// Convert into the concrete type `T`, handing the record back on mismatch.
    pub fn downcast<T: RecordType>(self: Box<Self>) -> Result<T, Box<dyn Record>> {
        if !self.is::<T>() {
            return Err(self);
        }
        match self.into_any().downcast::<T>() {
            Ok(value) => Ok(*value),
            Err(_) => unreachable!("concrete type checked above"),
        }
    }
}

impl Clone for Box<dyn Record> {
    fn clone(&self) -> Self {
        self.clone_record()
    }
}

impl PartialEq for Box<dyn Record> {
    fn eq(&self, other: &Self) -> bool {
        self.eq_record(other.as_ref())
    }
}

/// Implement [`RecordType`] for a struct that embeds [`EntityMeta`].
///
/// The type tag is the struct's name and the type location is the module
/// path of the invocation site.
///
/// ```
/// use dbcore_types::{record_type, EntityMeta};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
/// pub struct Widget {
///     #[serde(flatten)]
///     pub meta: EntityMeta,
///     pub label: String,
/// }
///
/// record_type!(Widget, meta);
/// ```
#[macro_export]
macro_rules! record_type {
    ($ty:ident, $field:ident) => {
        impl $crate::RecordType for $ty {
            const TYPE_TAG: &'static str = stringify!($ty);
            const TYPE_LOCATION: &'static str = module_path!();

            fn meta(&self) -> &$crate::EntityMeta {
                &self.$field
            }

            fn meta_mut(&mut self) -> &mut $crate::EntityMeta {
                &mut self.$field
            }
        }
    };
}

/// The plain entity: identity and lifecycle fields only.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseEntity {
    #[serde(flatten)]
    pub meta: EntityMeta,
}

impl BaseEntity {
    pub fn new() -> Self {
        Self {
            meta: EntityMeta::new(),
        }
    }
}

record_type!(BaseEntity, meta);

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    struct Widget {
        #[serde(flatten)]
        meta: EntityMeta,
        label: String,
        weight: u32,
    }

    record_type!(Widget, meta);

    fn widget(label: &str) -> Widget {
        Widget {
            meta: EntityMeta::new(),
            label: label.into(),
            weight: 7,
        }
    }

    #[test]
    fn macro_sets_tag_and_location() {
        assert_eq!(Widget::TYPE_TAG, "Widget");
        assert_eq!(Widget::TYPE_LOCATION, "dbcore_types::record::tests");
        assert_eq!(BaseEntity::TYPE_TAG, "BaseEntity");
        assert_eq!(BaseEntity::TYPE_LOCATION, "dbcore_types::record");
    }

    #[test]
    fn attributes_are_flat() {
        let w = widget("gear");
        let attrs = w.to_attributes().unwrap();
        let value: serde_json::Value = serde_json::from_str(&attrs).unwrap();
        assert_eq!(value["label"], "gear");
        assert_eq!(value["uuid"], w.meta.id.to_string());
        assert!(value.get("meta").is_none());
    }

    #[test]
    fn attributes_roundtrip() {
        let w = widget("gear");
        let back = Widget::from_attributes(&w.to_attributes().unwrap()).unwrap();
        assert_eq!(w, back);
    }

    #[test]
    fn from_attributes_rejects_wrong_shape() {
        let err = Widget::from_attributes(r#"{"uuid":"00000000-0000-0000-0000-000000000000"}"#)
            .unwrap_err();
        assert!(matches!(err, TypeError::Serialization(_)));
    }

    #[test]
    fn dyn_record_exposes_meta() {
        let mut boxed: Box<dyn Record> = Box::new(widget("gear"));
        let id = boxed.id();
        assert_eq!(boxed.type_tag(), "Widget");
        boxed.meta_mut().is_deleted = true;
        assert!(boxed.meta().is_deleted);
        assert_eq!(boxed.meta().id, id);
    }

    #[test]
    fn downcast_to_concrete_type() {
        let w = widget("gear");
        let boxed: Box<dyn Record> = Box::new(w.clone());
        assert!(boxed.is::<Widget>());
        assert_eq!(boxed.downcast_ref::<Widget>(), Some(&w));
        assert_eq!(boxed.downcast::<Widget>().unwrap(), w);
    }

    #[test]
    fn downcast_mismatch_returns_record() {
        let boxed: Box<dyn Record> = Box::new(BaseEntity::new());
        let id = boxed.id();
        let back = boxed.downcast::<Widget>().unwrap_err();
        assert_eq!(back.id(), id);
    }

    #[test]
    fn dyn_equality_requires_same_type() {
        let w = widget("gear");
        let base = BaseEntity { meta: w.meta.clone() };
        let a: Box<dyn Record> = Box::new(w.clone());
        let b: Box<dyn Record> = Box::new(w);
        let c: Box<dyn Record> = Box::new(base);
        assert_eq!(a, b);
        assert!(a != c);
        assert!(a.eq_record(b.as_ref()));
    }

    #[test]
    fn boxed_records_compare_in_collections() {
        let w = widget("gear");
        let listed: Vec<Box<dyn Record>> = vec![
            Box::new(w) as Box<dyn Record>,
            Box::new(BaseEntity::new()) as Box<dyn Record>,
        ];
        let copy = listed.clone();
        assert_eq!(listed, copy);
        assert_ne!(listed[0], copy[1]);
    }

    #[test]
    fn boxed_clone_is_deep() {
        let a: Box<dyn Record> = Box::new(widget("gear"));
        let mut b = a.clone();
        b.meta_mut().is_deleted = true;
        assert!(!a.meta().is_deleted);
    }
}

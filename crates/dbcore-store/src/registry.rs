//! Type registry: maps a stored `(type_location, type_tag)` pair back to the
//! concrete record type that can decode its attributes.
//!
//! Registration happens once at startup. Resolution is a pure lookup and an
//! unknown pair is always an error; there is no fallback to [`BaseEntity`],
//! which would silently drop fields on the next write.
//!
//! [`BaseEntity`]: dbcore_types::BaseEntity

use std::collections::HashMap;
use std::fmt;

use dbcore_types::{BaseEntity, Record, RecordType, TypeError};

use crate::error::{StoreError, StoreResult};

/// Decodes an attribute payload into a boxed concrete record.
pub type DecodeFn = fn(&str) -> Result<Box<dyn Record>, TypeError>;

/// Fully-qualified name of a registered record type.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeName {
    pub location: String,
    pub tag: String,
}

impl TypeName {
    pub fn new(location: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            tag: tag.into(),
        }
    }

    /// The name of a concrete record type.
    pub fn of<T: RecordType>() -> Self {
        Self::new(T::TYPE_LOCATION, T::TYPE_TAG)
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.location, self.tag)
    }
}

fn decode_as<T: RecordType>(attributes: &str) -> Result<Box<dyn Record>, TypeError> {
    Ok(Box::new(T::from_attributes(attributes)?))
}

/// Lookup table from stored type names to decoders.
#[derive(Clone, Default)]
pub struct TypeRegistry {
    decoders: HashMap<TypeName, DecodeFn>,
}

impl TypeRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with [`BaseEntity`] already registered.
    pub fn with_base_types() -> Self {
        let mut registry = Self::new();
        registry.register::<BaseEntity>();
        registry
    }

    /// Register a concrete record type under its own tag and location.
    ///
    /// Registering the same name twice replaces the earlier entry.
    pub fn register<T: RecordType>(&mut self) -> &mut Self {
        self.decoders.insert(TypeName::of::<T>(), decode_as::<T>);
        self
    }

    /// Register a decoder under an explicit name.
    ///
    /// Used when stored data names a type by a location other than the
    /// type's current module path, e.g. after the type was moved.
    pub fn register_decoder(
        &mut self,
        location: impl Into<String>,
        tag: impl Into<String>,
        decoder: DecodeFn,
    ) -> &mut Self {
        self.decoders.insert(TypeName::new(location, tag), decoder);
        self
    }

    /// Register `T` under an additional, explicit name.
    pub fn register_alias<T: RecordType>(
        &mut self,
        location: impl Into<String>,
        tag: impl Into<String>,
    ) -> &mut Self {
        self.register_decoder(location, tag, decode_as::<T>)
    }

    /// Look up the decoder for a stored type name.
    pub fn resolve(&self, location: &str, tag: &str) -> StoreResult<DecodeFn> {
        self.decoders
            .get(&TypeName::new(location, tag))
            .copied()
            .ok_or_else(|| StoreError::TypeResolution {
                type_location: location.to_string(),
                type_tag: tag.to_string(),
            })
    }

    pub fn contains(&self, location: &str, tag: &str) -> bool {
        self.decoders.contains_key(&TypeName::new(location, tag))
    }

    pub fn len(&self) -> usize {
        self.decoders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decoders.is_empty()
    }

    /// Sorted list of registered type names.
    pub fn names(&self) -> Vec<TypeName> {
        let mut names: Vec<TypeName> = self.decoders.keys().cloned().collect();
        names.sort();
        names
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("types", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dbcore_types::{record_type, EntityMeta};
    use serde::{Deserialize, Serialize};

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    struct Gadget {
        #[serde(flatten)]
        meta: EntityMeta,
        serial: String,
    }

    record_type!(Gadget, meta);

    fn gadget() -> Gadget {
        Gadget {
            meta: EntityMeta::new(),
            serial: "G-1".into(),
        }
    }

    #[test]
    fn empty_registry_resolves_nothing() {
        let registry = TypeRegistry::new();
        assert!(registry.is_empty());
        let err = registry.resolve("dbcore_types::record", "BaseEntity").unwrap_err();
        assert!(err.is_type_resolution());
    }

    #[test]
    fn base_types_are_preregistered() {
        let registry = TypeRegistry::with_base_types();
        assert_eq!(registry.len(), 1);
        assert!(registry.contains(BaseEntity::TYPE_LOCATION, BaseEntity::TYPE_TAG));
    }

    #[test]
    fn resolves_to_exact_concrete_type() {
        let mut registry = TypeRegistry::with_base_types();
        registry.register::<Gadget>();

        let g = gadget();
        let decoder = registry.resolve(Gadget::TYPE_LOCATION, "Gadget").unwrap();
        let record = decoder(&g.to_attributes().unwrap()).unwrap();
        assert!(record.is::<Gadget>());
        assert_eq!(record.downcast_ref::<Gadget>(), Some(&g));
    }

    #[test]
    fn tag_alone_is_not_enough() {
        let mut registry = TypeRegistry::new();
        registry.register::<Gadget>();
        assert!(registry.resolve("other::module", "Gadget").is_err());
    }

    #[test]
    fn alias_resolves_moved_type() {
        let mut registry = TypeRegistry::new();
        registry.register_alias::<Gadget>("legacy.models", "Gadget");
        let decoder = registry.resolve("legacy.models", "Gadget").unwrap();
        let record = decoder(&gadget().to_attributes().unwrap()).unwrap();
        assert!(record.is::<Gadget>());
    }

    #[test]
    fn reregistering_replaces() {
        let mut registry = TypeRegistry::new();
        registry.register::<Gadget>().register::<Gadget>();
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn names_are_sorted() {
        let mut registry = TypeRegistry::with_base_types();
        registry.register::<Gadget>();
        let names = registry.names();
        assert_eq!(names.len(), 2);
        assert!(names[0] <= names[1]);
        assert!(format!("{registry:?}").contains("Gadget"));
    }
}

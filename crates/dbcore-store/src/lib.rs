//! File-per-record persistence for dbcore.
//!
//! Every record is stored as a self-describing [`Envelope`] under a
//! [`RecordKey`] of `(type_tag, id)`. On read the envelope's type names are
//! resolved through a [`TypeRegistry`] so the exact concrete type that was
//! written comes back, even when the caller only asked for a key.
//!
//! # Storage Backends
//!
//! All backends implement the [`RecordStore`] trait:
//!
//! - [`FileRecordStore`] -- one file per record under a base directory
//! - [`InMemoryRecordStore`] -- `HashMap`-based store for tests and embedding
//!
//! # Design Rules
//!
//! 1. Writes are last-write-wins; there is no version check.
//! 2. A file is replaced atomically, never rewritten in place.
//! 3. Listing is exact on the type tag: `User` never matches `UserProfile`.
//! 4. Soft deletion is a field on the record; only `delete` removes files.
//! 5. All I/O errors are propagated, never silently ignored.

pub mod config;
pub mod envelope;
pub mod error;
pub mod file;
pub mod key;
pub mod memory;
pub mod registry;
pub mod traits;

// Re-export primary types at crate root for ergonomic imports.
pub use config::{ListPolicy, StoreConfig};
pub use envelope::Envelope;
pub use error::{StoreError, StoreResult};
pub use file::FileRecordStore;
pub use key::RecordKey;
pub use memory::InMemoryRecordStore;
pub use registry::{DecodeFn, TypeName, TypeRegistry};
pub use traits::{RecordStore, RecordStoreExt};

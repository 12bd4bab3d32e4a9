//! Entity base model for dbcore.
//!
//! Every record persisted by `dbcore-store` carries the same identity and
//! lifecycle fields. This crate defines those fields and the contract that
//! lets a store keep many concrete record types behind one interface.
//!
//! # Key Types
//!
//! - [`EntityId`] — UUID v7 identifier, assigned once at construction
//! - [`EntityMeta`] — identity, parent link, timestamps, soft-delete marker
//! - [`RecordType`] — implemented by concrete record structs
//! - [`Record`] — object-safe view used by stores and services
//! - [`BaseEntity`] — a record with nothing but [`EntityMeta`]

pub mod error;
pub mod id;
pub mod meta;
pub mod record;
pub mod timestamp;

pub use error::TypeError;
pub use id::EntityId;
pub use meta::EntityMeta;
pub use record::{BaseEntity, Record, RecordType};

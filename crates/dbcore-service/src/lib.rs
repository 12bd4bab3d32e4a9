//! Record lifecycle service for dbcore.
//!
//! Wraps any [`dbcore_store::RecordStore`] with the helpers applications
//! call around a write: linking a record to a parent, stamping creation and
//! modification times, and soft deletion. Physical removal stays a separate,
//! explicit [`RecordService::purge`].

pub mod clock;
pub mod error;
pub mod lifecycle;
pub mod service;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{ServiceError, ServiceResult};
pub use service::RecordService;

//! Sync Cursors
//!
//! One watermark per tenant and entity type recording how far incremental
//! synchronisation has progressed. Writes only ever move the watermark forward;
//! [`SyncCursorsService::reset_cursor`] is the single administrative exception.

pub mod data;
pub mod errors;
pub mod records;
pub(crate) mod repository;
pub mod service;
pub mod value;

pub use errors::SyncCursorsServiceError;
pub use service::*;
pub use value::CursorValue;

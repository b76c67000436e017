//! Job Audits
//!
//! One row per job attempt. A row is written as `PROCESSING` when a worker claims the
//! job and settled exactly once afterwards; settled rows are never touched again.

pub mod data;
pub mod errors;
pub mod records;
mod repository;
pub mod service;

pub use errors::JobAuditsServiceError;
pub use service::*;

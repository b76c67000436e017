//! Job Queue
//!
//! Durable at-least-once queue on PostgreSQL. Claims take a visibility lease; a job
//! whose lease expires without being settled becomes claimable again, so every
//! processor must tolerate re-delivery.

pub mod data;
pub mod errors;
pub mod records;
mod repository;
pub mod retry;
pub mod service;

pub use errors::JobQueueError;
pub use retry::RetryPolicy;
pub use service::*;

//! Webhook Events
//!
//! Durable record of every inbound notification, written before any work is derived
//! from it.

pub mod data;
pub mod errors;
pub mod records;
mod repository;
pub mod service;

pub use errors::WebhookEventsServiceError;
pub use service::*;

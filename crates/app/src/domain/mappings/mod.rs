//! Entity Mappings
//!
//! Bidirectional lookup between an entity's e-commerce id and its ERP id, per tenant and
//! entity type. Both columns are unique within `(tenant, entity_type)`, so a mapping is a
//! bijection: any write that would pair an id with a second partner fails with
//! [`MappingsServiceError::Conflict`].

pub mod data;
pub mod errors;
pub mod records;
mod repository;
pub mod service;

pub use errors::{MappingsServiceError, OptionalMapping};
pub use service::*;

//! Credentials
//!
//! Per-tenant platform credentials. Processors resolve them once per attempt; a missing
//! or inactive credential is an operator problem and never retried.

pub mod data;
pub mod errors;
pub mod records;
mod repository;
pub mod secret;
pub mod service;

pub use errors::CredentialsServiceError;
pub use secret::Secret;
pub use service::*;

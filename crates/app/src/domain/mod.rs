//! Persistent domain concerns

pub mod audits;
pub mod credentials;
pub mod cursors;
pub mod entities;
pub mod jobs;
pub mod mappings;
pub mod tenants;
pub mod webhooks;

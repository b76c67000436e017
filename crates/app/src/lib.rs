//! Tenant-scoped reconciliation between an e-commerce platform and an ERP.

pub mod context;
pub mod database;
pub mod domain;
pub mod engine;
pub mod platforms;
pub mod translation;

#[cfg(test)]
mod test;

pub mod uuids;

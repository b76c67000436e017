//! Platform clients
//!
//! The engine only ever talks to the two external platforms through the
//! [`ecommerce::EcommerceClient`] and [`erp::ErpClient`] traits; [`ClientFactory`]
//! builds tenant-scoped instances from resolved credentials.

pub mod ecommerce;
pub mod erp;
pub mod errors;
pub mod factory;

pub use errors::PlatformError;
pub use factory::{ClientFactory, HttpClientFactory, PlatformSettings};

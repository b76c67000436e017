//! ERP platform

mod client;
pub mod models;

pub use client::{ErpClient, HttpErpClient, MockErpClient};

//! E-commerce platform

mod client;
pub mod models;

pub use client::{EcommerceClient, HttpEcommerceClient, MockEcommerceClient};

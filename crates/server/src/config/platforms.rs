//! Platform Config

use std::time::Duration;

use clap::Args;

use syncbridge_app::{engine::DEFAULT_PAGE_SIZE, platforms::PlatformSettings};

/// E-commerce and ERP endpoints shared by every tenant.
#[derive(Debug, Args)]
pub struct PlatformsConfig {
    /// E-commerce REST API base URL
    #[arg(long, env = "ECOMMERCE_BASE_URL")]
    pub ecommerce_base_url: String,

    /// ERP service base URL
    #[arg(long, env = "ERP_BASE_URL")]
    pub erp_base_url: String,

    /// Timeout for a single outgoing platform request, in seconds
    #[arg(long, env = "PLATFORM_REQUEST_TIMEOUT_SECONDS", default_value_t = 30_u64)]
    pub platform_request_timeout_seconds: u64,

    /// ERP customer code used for orders whose customer has no mapping
    #[arg(long, env = "DEFAULT_CUSTOMER_CODE")]
    pub default_customer_code: Option<String>,

    /// Records requested per cursor-sync page
    #[arg(long, env = "SYNC_PAGE_SIZE", default_value_t = DEFAULT_PAGE_SIZE)]
    pub sync_page_size: u32,
}

impl PlatformsConfig {
    /// Client settings for the platform factory.
    #[must_use]
    pub fn settings(&self) -> PlatformSettings {
        PlatformSettings {
            ecommerce_base_url: self.ecommerce_base_url.clone(),
            erp_base_url: self.erp_base_url.clone(),
            request_timeout: Duration::from_secs(self.platform_request_timeout_seconds),
        }
    }
}

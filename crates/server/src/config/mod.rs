//! Server configuration module

use clap::Parser;

use syncbridge_app::{context::EngineSettings, domain::jobs::records::Queue, engine::WorkerSettings};

use crate::config::{
    db::DatabaseConfig,
    observability::{LoggingConfig, ObservabilityConfig},
    platforms::PlatformsConfig,
    server::ServerRuntimeConfig,
    workers::WorkersConfig,
};

pub(crate) mod db;
pub(crate) mod observability;
pub(crate) mod platforms;
pub(crate) mod server;
pub(crate) mod workers;

/// `SyncBridge` server configuration
#[derive(Debug, Parser)]
#[command(name = "syncbridge-server", about = "SyncBridge reconciliation server", long_about = None)]
pub struct ServerConfig {
    /// Server network settings.
    #[command(flatten)]
    pub server: ServerRuntimeConfig,

    /// Logging output settings.
    #[command(flatten)]
    pub logging: LoggingConfig,

    /// Observability (traces/metrics) settings.
    #[command(flatten)]
    pub observability: ObservabilityConfig,

    /// Application database settings.
    #[command(flatten)]
    pub database: DatabaseConfig,

    /// E-commerce and ERP endpoints.
    #[command(flatten)]
    pub platforms: PlatformsConfig,

    /// Worker pools, retries and scheduling.
    #[command(flatten)]
    pub workers: WorkersConfig,
}

impl ServerConfig {
    /// Load configuration from environment and CLI arguments
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be parsed or is inconsistent
    pub fn load() -> Result<Self, clap::Error> {
        // Load .env file if present (ignore if missing)
        _ = dotenvy::dotenv();

        let config = Self::try_parse()?;
        config.workers.validate()?;

        Ok(config)
    }

    /// Get the socket address for binding
    #[must_use]
    pub fn socket_addr(&self) -> String {
        self.server.socket_addr()
    }

    /// Engine settings shared by processors and the dispatcher.
    #[must_use]
    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            platforms: self.platforms.settings(),
            retry_policy: self.workers.retry_policy(),
            default_customer_code: self.platforms.default_customer_code.clone(),
            page_size: self.platforms.sync_page_size,
        }
    }

    /// Pool settings for `queue`.
    #[must_use]
    pub fn worker_settings(&self, queue: Queue) -> WorkerSettings {
        self.workers.settings_for(queue)
    }
}

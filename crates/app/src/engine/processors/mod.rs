//! Reconciliation processors
//!
//! One processor per queue. Each receives a decoded job, talks to the platforms through
//! tenant-scoped clients and records its effects in the mapping and cursor stores. All
//! of them tolerate re-delivery: a job processed twice leaves the same mapping state as
//! a job processed once.

mod cursor_sync;
mod orders;
mod products;

use std::sync::Arc;

use async_trait::async_trait;
use mockall::automock;

pub use cursor_sync::{CursorSyncProcessor, DEFAULT_PAGE_SIZE};
pub use orders::OrderProcessor;
pub use products::ProductProcessor;

use crate::{
    domain::{
        credentials::CredentialsService,
        jobs::records::{JobUuid, Operation},
        tenants::records::TenantUuid,
    },
    engine::{JobPayload, ProcessOutcome, SyncError},
    platforms::{ClientFactory, ecommerce::EcommerceClient, erp::ErpClient},
};

/// A claimed job with its payload decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimedJob {
    pub uuid: JobUuid,
    pub tenant: TenantUuid,
    pub operation: Operation,
    pub attempt: u32,
    pub payload: JobPayload,
}

#[automock]
#[async_trait]
pub trait Processor: Send + Sync {
    /// Perform one attempt of `job`.
    async fn process(&self, job: &ClaimedJob) -> Result<ProcessOutcome, SyncError>;
}

/// Both platform clients for one tenant.
pub(crate) struct TenantClients {
    pub ecommerce: Arc<dyn EcommerceClient>,
    pub erp: Arc<dyn ErpClient>,
}

/// Resolves credentials and builds clients once per attempt.
#[derive(Clone)]
pub struct ClientResolver {
    credentials: Arc<dyn CredentialsService>,
    factory: Arc<dyn ClientFactory>,
}

impl ClientResolver {
    #[must_use]
    pub fn new(credentials: Arc<dyn CredentialsService>, factory: Arc<dyn ClientFactory>) -> Self {
        Self {
            credentials,
            factory,
        }
    }

    pub(crate) async fn resolve(&self, tenant: TenantUuid) -> Result<TenantClients, SyncError> {
        let credentials = self.credentials.resolve(tenant).await?;

        Ok(TenantClients {
            ecommerce: self.factory.ecommerce(&credentials),
            erp: self.factory.erp(&credentials),
        })
    }
}

impl std::fmt::Debug for ClientResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientResolver").finish_non_exhaustive()
    }
}

//! Tenants service.

use async_trait::async_trait;
use mockall::automock;
use tracing::info;

use crate::{
    database::Db,
    domain::{
        cursors::repository::PgSyncCursorsRepository,
        entities::EntityType,
        tenants::{
            data::NewTenant,
            errors::TenantsServiceError,
            records::{TenantRecord, TenantUuid},
            repository::PgTenantsRepository,
        },
    },
};

#[derive(Debug, Clone)]
pub struct PgTenantsService {
    db: Db,
    repository: PgTenantsRepository,
    cursors: PgSyncCursorsRepository,
}

impl PgTenantsService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            repository: PgTenantsRepository::new(),
            cursors: PgSyncCursorsRepository::new(),
        }
    }
}

#[async_trait]
impl TenantsService for PgTenantsService {
    async fn create_tenant(&self, tenant: NewTenant) -> Result<TenantRecord, TenantsServiceError> {
        let mut tx = self.db.begin_tenant_transaction(tenant.uuid).await?;

        let created = self.repository.create_tenant(&mut tx, tenant).await?;

        for entity_type in EntityType::ALL {
            self.cursors
                .create_initial_cursor(&mut tx, created.uuid, entity_type)
                .await?;
        }

        tx.commit().await?;

        info!(tenant = %created.uuid, name = %created.name, "tenant provisioned");

        Ok(created)
    }

    async fn get_tenant(&self, tenant: TenantUuid) -> Result<TenantRecord, TenantsServiceError> {
        let mut tx = self.db.begin_system_transaction().await?;

        let record = self.repository.get_tenant(&mut tx, tenant).await?;

        tx.commit().await?;

        Ok(record)
    }

    async fn list_active_tenants(&self) -> Result<Vec<TenantRecord>, TenantsServiceError> {
        let mut tx = self.db.begin_system_transaction().await?;

        let tenants = self.repository.list_active_tenants(&mut tx).await?;

        tx.commit().await?;

        Ok(tenants)
    }

    async fn deactivate_tenant(
        &self,
        tenant: TenantUuid,
    ) -> Result<TenantRecord, TenantsServiceError> {
        let mut tx = self.db.begin_system_transaction().await?;

        let record = self.repository.deactivate_tenant(&mut tx, tenant).await?;

        tx.commit().await?;

        info!(tenant = %record.uuid, "tenant deactivated");

        Ok(record)
    }
}

#[automock]
#[async_trait]
/// Tenant persistence operations.
pub trait TenantsService: Send + Sync {
    /// Creates a new tenant together with an empty sync cursor per entity type.
    async fn create_tenant(&self, tenant: NewTenant) -> Result<TenantRecord, TenantsServiceError>;

    /// Retrieve a tenant, active or not.
    async fn get_tenant(&self, tenant: TenantUuid) -> Result<TenantRecord, TenantsServiceError>;

    /// Tenants eligible for scheduled synchronisation.
    async fn list_active_tenants(&self) -> Result<Vec<TenantRecord>, TenantsServiceError>;

    /// Suppress all further processing for a tenant.
    async fn deactivate_tenant(
        &self,
        tenant: TenantUuid,
    ) -> Result<TenantRecord, TenantsServiceError>;
}

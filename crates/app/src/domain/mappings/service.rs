//! Mappings service.

use async_trait::async_trait;
use mockall::automock;

use crate::{
    database::Db,
    domain::{
        entities::EntityType,
        mappings::{
            data::NewMapping,
            errors::MappingsServiceError,
            records::{MappingRecord, MappingUuid},
            repository::{Anchor, PgMappingsRepository},
        },
        tenants::records::TenantUuid,
    },
};

#[derive(Debug, Clone)]
pub struct PgMappingsService {
    db: Db,
    repository: PgMappingsRepository,
}

impl PgMappingsService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            repository: PgMappingsRepository::new(),
        }
    }

    async fn upsert_anchored(
        &self,
        tenant: TenantUuid,
        mapping: NewMapping,
        anchor: Anchor,
    ) -> Result<MappingRecord, MappingsServiceError> {
        if mapping.ecommerce_id.is_empty() || mapping.erp_id.is_empty() {
            return Err(MappingsServiceError::InvalidData);
        }

        let mut tx = self.db.begin_tenant_transaction(tenant).await?;

        let record = self
            .repository
            .upsert_mapping(&mut tx, tenant, mapping, anchor)
            .await?;

        tx.commit().await?;

        Ok(record)
    }
}

#[async_trait]
impl MappingsService for PgMappingsService {
    async fn upsert(
        &self,
        tenant: TenantUuid,
        mapping: NewMapping,
    ) -> Result<MappingRecord, MappingsServiceError> {
        self.upsert_anchored(tenant, mapping, Anchor::Ecommerce)
            .await
    }

    async fn upsert_by_erp_id(
        &self,
        tenant: TenantUuid,
        mapping: NewMapping,
    ) -> Result<MappingRecord, MappingsServiceError> {
        self.upsert_anchored(tenant, mapping, Anchor::Erp).await
    }

    async fn find_by_ecommerce_id(
        &self,
        tenant: TenantUuid,
        entity_type: EntityType,
        ecommerce_id: &str,
    ) -> Result<MappingRecord, MappingsServiceError> {
        let mut tx = self.db.begin_tenant_transaction(tenant).await?;

        let mapping = self
            .repository
            .find_by_ecommerce_id(&mut tx, entity_type, ecommerce_id)
            .await?;

        tx.commit().await?;

        Ok(mapping)
    }

    async fn find_by_erp_id(
        &self,
        tenant: TenantUuid,
        entity_type: EntityType,
        erp_id: &str,
    ) -> Result<MappingRecord, MappingsServiceError> {
        let mut tx = self.db.begin_tenant_transaction(tenant).await?;

        let mapping = self
            .repository
            .find_by_erp_id(&mut tx, entity_type, erp_id)
            .await?;

        tx.commit().await?;

        Ok(mapping)
    }

    async fn delete(
        &self,
        tenant: TenantUuid,
        mapping: MappingUuid,
    ) -> Result<(), MappingsServiceError> {
        let mut tx = self.db.begin_tenant_transaction(tenant).await?;

        let rows_affected = self.repository.delete_mapping(&mut tx, mapping).await?;

        if rows_affected == 0 {
            return Err(MappingsServiceError::NotFound);
        }

        tx.commit().await?;

        Ok(())
    }

    async fn list_by_entity_type(
        &self,
        tenant: TenantUuid,
        entity_type: EntityType,
    ) -> Result<Vec<MappingRecord>, MappingsServiceError> {
        let mut tx = self.db.begin_tenant_transaction(tenant).await?;

        let mappings = self
            .repository
            .list_by_entity_type(&mut tx, entity_type)
            .await?;

        tx.commit().await?;

        Ok(mappings)
    }
}

#[automock]
#[async_trait]
pub trait MappingsService: Send + Sync {
    /// Insert or refresh the mapping anchored on its e-commerce id.
    ///
    /// An existing mapping for the same e-commerce id has its ERP id and metadata
    /// overwritten. Fails with [`MappingsServiceError::Conflict`] when the ERP id is
    /// already mapped to a different e-commerce id.
    async fn upsert(
        &self,
        tenant: TenantUuid,
        mapping: NewMapping,
    ) -> Result<MappingRecord, MappingsServiceError>;

    /// Mirror of [`MappingsService::upsert`] anchored on the ERP id, for entities whose
    /// source of truth is the ERP.
    async fn upsert_by_erp_id(
        &self,
        tenant: TenantUuid,
        mapping: NewMapping,
    ) -> Result<MappingRecord, MappingsServiceError>;

    async fn find_by_ecommerce_id(
        &self,
        tenant: TenantUuid,
        entity_type: EntityType,
        ecommerce_id: &str,
    ) -> Result<MappingRecord, MappingsServiceError>;

    async fn find_by_erp_id(
        &self,
        tenant: TenantUuid,
        entity_type: EntityType,
        erp_id: &str,
    ) -> Result<MappingRecord, MappingsServiceError>;

    async fn delete(
        &self,
        tenant: TenantUuid,
        mapping: MappingUuid,
    ) -> Result<(), MappingsServiceError>;

    async fn list_by_entity_type(
        &self,
        tenant: TenantUuid,
        entity_type: EntityType,
    ) -> Result<Vec<MappingRecord>, MappingsServiceError>;
}

//! ERP products onto the e-commerce platform

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, info};

use crate::{
    domain::{
        entities::EntityType,
        jobs::records::Operation,
        mappings::{MappingsService, MappingsServiceError, OptionalMapping, data::NewMapping},
        tenants::records::TenantUuid,
    },
    engine::{
        JobPayload, ProcessOutcome, SyncError,
        processors::{ClaimedJob, ClientResolver, Processor},
    },
    platforms::PlatformError,
    translation,
};

/// Pushes ERP product changes to the e-commerce catalogue.
#[derive(Clone)]
pub struct ProductProcessor {
    clients: ClientResolver,
    mappings: Arc<dyn MappingsService>,
}

impl std::fmt::Debug for ProductProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProductProcessor")
            .field("clients", &self.clients)
            .finish_non_exhaustive()
    }
}

impl ProductProcessor {
    #[must_use]
    pub fn new(clients: ClientResolver, mappings: Arc<dyn MappingsService>) -> Self {
        Self { clients, mappings }
    }

    async fn upsert(&self, tenant: TenantUuid, code: &str) -> Result<ProcessOutcome, SyncError> {
        let clients = self.clients.resolve(tenant).await?;

        let product = clients.erp.get_product(code).await?;

        let existing = self
            .mappings
            .find_by_erp_id(tenant, EntityType::Product, code)
            .await
            .optional()?;

        let translated = translation::erp_product_to_ecommerce(
            &product,
            existing.as_ref().map(|mapping| mapping.ecommerce_id.as_str()),
        )?;

        let stored = clients.ecommerce.upsert_product(&translated).await?;
        let ecommerce_id = stored
            .id
            .clone()
            .ok_or(PlatformError::MissingData {
                platform: "ecommerce",
            })?;

        self.mappings
            .upsert_by_erp_id(
                tenant,
                NewMapping {
                    entity_type: EntityType::Product,
                    ecommerce_id: ecommerce_id.clone(),
                    erp_id: code.to_string(),
                    metadata: translation::snapshot(&stored, &product),
                },
            )
            .await?;

        info!(%tenant, code, %ecommerce_id, "product synced to ecommerce");

        Ok(ProcessOutcome::new(json!({
            "status": if existing.is_some() { "updated" } else { "created" },
            "ecommerce_id": ecommerce_id,
        })))
    }

    async fn delete(&self, tenant: TenantUuid, code: &str) -> Result<ProcessOutcome, SyncError> {
        let Some(mapping) = self
            .mappings
            .find_by_erp_id(tenant, EntityType::Product, code)
            .await
            .optional()?
        else {
            debug!(%tenant, code, "deleted product was never mapped");

            return Ok(ProcessOutcome::new(json!({ "status": "not_mapped" })));
        };

        let clients = self.clients.resolve(tenant).await?;

        clients.ecommerce.delete_product(&mapping.ecommerce_id).await?;

        match self.mappings.delete(tenant, mapping.uuid).await {
            Ok(()) | Err(MappingsServiceError::NotFound) => {}
            Err(error) => return Err(error.into()),
        }

        info!(%tenant, code, ecommerce_id = %mapping.ecommerce_id, "product deleted from ecommerce");

        Ok(ProcessOutcome::new(json!({
            "status": "deleted",
            "ecommerce_id": mapping.ecommerce_id,
        })))
    }
}

#[async_trait]
impl Processor for ProductProcessor {
    async fn process(&self, job: &ClaimedJob) -> Result<ProcessOutcome, SyncError> {
        let JobPayload::Product { code } = &job.payload else {
            return Err(SyncError::InvalidPayload(
                "product processor received a non-product job".to_string(),
            ));
        };

        match job.operation {
            Operation::Create | Operation::Update => self.upsert(job.tenant, code).await,
            Operation::Delete => self.delete(job.tenant, code).await,
            Operation::Sync => Err(SyncError::InvalidPayload(
                "product jobs do not sync; use a cursor-sync job".to_string(),
            )),
        }
    }
}

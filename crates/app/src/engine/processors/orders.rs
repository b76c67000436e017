//! E-commerce orders into the ERP

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::{
    domain::{
        entities::EntityType,
        mappings::{MappingsService, OptionalMapping, data::NewMapping},
        tenants::records::TenantUuid,
    },
    engine::{
        JobPayload, ProcessOutcome, SyncError,
        processors::{ClaimedJob, ClientResolver, Processor},
    },
    platforms::ecommerce::models::EcommerceOrder,
    translation::{self, OrderReferences},
};

/// Replicates an e-commerce order into the ERP, once.
#[derive(Clone)]
pub struct OrderProcessor {
    clients: ClientResolver,
    mappings: Arc<dyn MappingsService>,
    default_customer_code: Option<String>,
}

impl std::fmt::Debug for OrderProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderProcessor")
            .field("clients", &self.clients)
            .field("default_customer_code", &self.default_customer_code)
            .finish_non_exhaustive()
    }
}

impl OrderProcessor {
    #[must_use]
    pub fn new(
        clients: ClientResolver,
        mappings: Arc<dyn MappingsService>,
        default_customer_code: Option<String>,
    ) -> Self {
        Self {
            clients,
            mappings,
            default_customer_code,
        }
    }

    async fn references(
        &self,
        tenant: TenantUuid,
        order: &EcommerceOrder,
    ) -> Result<OrderReferences, SyncError> {
        let mut product_codes = HashMap::new();

        for item in &order.items {
            if product_codes.contains_key(&item.product_id) {
                continue;
            }

            if let Some(mapping) = self
                .mappings
                .find_by_ecommerce_id(tenant, EntityType::Product, &item.product_id)
                .await
                .optional()?
            {
                product_codes.insert(item.product_id.clone(), mapping.erp_id);
            }
        }

        let customer_code = self
            .mappings
            .find_by_ecommerce_id(tenant, EntityType::Customer, &order.customer_id)
            .await
            .optional()?
            .map(|mapping| mapping.erp_id)
            .or_else(|| self.default_customer_code.clone());

        Ok(OrderReferences {
            product_codes,
            customer_code,
        })
    }
}

#[async_trait]
impl Processor for OrderProcessor {
    async fn process(&self, job: &ClaimedJob) -> Result<ProcessOutcome, SyncError> {
        let JobPayload::Order { order_id } = &job.payload else {
            return Err(SyncError::InvalidPayload(
                "order processor received a non-order job".to_string(),
            ));
        };

        let tenant = job.tenant;

        if let Some(existing) = self
            .mappings
            .find_by_ecommerce_id(tenant, EntityType::Order, order_id)
            .await
            .optional()?
        {
            debug!(%tenant, %order_id, erp_number = %existing.erp_id, "order already replicated");

            return Ok(ProcessOutcome::new(json!({
                "status": "already_mapped",
                "erp_number": existing.erp_id,
            })));
        }

        let clients = self.clients.resolve(tenant).await?;

        let order = clients.ecommerce.get_order(order_id).await?;
        let references = self.references(tenant, &order).await?;
        let erp_order = translation::ecommerce_order_to_erp(&order, &references)?;

        let created = clients.erp.create_order(&erp_order).await?;

        // The ERP holds the order now; a retry would create it a second time.
        let Some(number) = created.number.clone() else {
            warn!(%tenant, %order_id, "erp accepted order without returning its number");

            return Err(SyncError::Conflict(format!(
                "erp accepted order {order_id} without a number; reconcile it before replaying"
            )));
        };

        self.mappings
            .upsert(
                tenant,
                NewMapping {
                    entity_type: EntityType::Order,
                    ecommerce_id: order_id.clone(),
                    erp_id: number.clone(),
                    metadata: translation::snapshot(&order, &created),
                },
            )
            .await?;

        info!(%tenant, %order_id, erp_number = %number, "order replicated to erp");

        Ok(ProcessOutcome::new(json!({
            "status": "created",
            "erp_number": number,
        })))
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;
    use crate::{
        domain::jobs::records::{JobUuid, Operation},
        test::{
            fakes::{FakeClientFactory, ecommerce_order},
            memory::{MemoryCredentials, MemoryMappings},
        },
        translation::TranslationError,
    };

    fn processor(
        factory: &FakeClientFactory,
        mappings: &Arc<MemoryMappings>,
        default_customer: Option<&str>,
    ) -> OrderProcessor {
        OrderProcessor::new(
            ClientResolver::new(
                Arc::new(MemoryCredentials::complete()),
                Arc::new(factory.clone()),
            ),
            mappings.clone(),
            default_customer.map(str::to_string),
        )
    }

    fn order_job(tenant: TenantUuid, order_id: &str) -> ClaimedJob {
        ClaimedJob {
            uuid: JobUuid::new(),
            tenant,
            operation: Operation::Create,
            attempt: 1,
            payload: JobPayload::Order {
                order_id: order_id.to_string(),
            },
        }
    }

    #[tokio::test]
    async fn creates_erp_order_and_maps_it() -> TestResult {
        let tenant = TenantUuid::new();
        let factory = FakeClientFactory::default();
        let mappings = Arc::new(MemoryMappings::default());
        mappings.seed(tenant, EntityType::Product, "E-1", "P1");
        mappings.seed(tenant, EntityType::Customer, "buyer-1", "CUST-9");
        factory
            .ecommerce
            .add_order(ecommerce_order("O1", "buyer-1", &["E-1"]));

        let outcome = processor(&factory, &mappings, None)
            .process(&order_job(tenant, "O1"))
            .await?;

        let orders = factory.erp.orders();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].customer_code, "CUST-9");
        assert_eq!(orders[0].items[0].product_code, "P1");

        let mapping = mappings
            .find_by_ecommerce_id(tenant, EntityType::Order, "O1")
            .await?;
        assert_eq!(Some(mapping.erp_id.as_str()), orders[0].number.as_deref());
        assert_eq!(outcome.result["status"], "created");

        Ok(())
    }

    #[tokio::test]
    async fn replayed_order_is_not_created_twice() -> TestResult {
        let tenant = TenantUuid::new();
        let factory = FakeClientFactory::default();
        let mappings = Arc::new(MemoryMappings::default());
        mappings.seed(tenant, EntityType::Product, "E-1", "P1");
        factory
            .ecommerce
            .add_order(ecommerce_order("O1", "buyer-1", &["E-1"]));
        let processor = processor(&factory, &mappings, Some("DEFAULT"));

        processor.process(&order_job(tenant, "O1")).await?;
        let replay = processor.process(&order_job(tenant, "O1")).await?;

        assert_eq!(replay.result["status"], "already_mapped");
        assert_eq!(factory.erp.orders().len(), 1);
        assert_eq!(mappings.count(EntityType::Order), 1);

        Ok(())
    }

    #[tokio::test]
    async fn unnumbered_erp_order_is_not_retried() {
        let tenant = TenantUuid::new();
        let factory = FakeClientFactory::default();
        let mappings = Arc::new(MemoryMappings::default());
        mappings.seed(tenant, EntityType::Product, "E-1", "P1");
        factory
            .ecommerce
            .add_order(ecommerce_order("O1", "buyer-1", &["E-1"]));
        factory.erp.stop_numbering();

        let result = processor(&factory, &mappings, Some("DEFAULT"))
            .process(&order_job(tenant, "O1"))
            .await;

        assert!(
            matches!(&result, Err(SyncError::Conflict(_))),
            "expected Conflict, got {result:?}"
        );
        assert!(result.is_err_and(|error| !error.is_retryable()));
        assert_eq!(factory.erp.orders().len(), 1);
        assert_eq!(mappings.count(EntityType::Order), 0);
    }

    #[tokio::test]
    async fn unmapped_item_creates_nothing() {
        let tenant = TenantUuid::new();
        let factory = FakeClientFactory::default();
        let mappings = Arc::new(MemoryMappings::default());
        mappings.seed(tenant, EntityType::Product, "E-1", "P1");
        factory
            .ecommerce
            .add_order(ecommerce_order("O1", "buyer-1", &["E-1", "E-2"]));

        let result = processor(&factory, &mappings, Some("DEFAULT"))
            .process(&order_job(tenant, "O1"))
            .await;

        assert!(
            matches!(
                &result,
                Err(SyncError::Translation(TranslationError::UnmappedProduct { product_id }))
                    if product_id == "E-2"
            ),
            "expected UnmappedProduct, got {result:?}"
        );
        assert!(factory.erp.orders().is_empty());
        assert_eq!(mappings.count(EntityType::Order), 0);
    }

    #[tokio::test]
    async fn unmapped_customer_without_default_is_rejected() {
        let tenant = TenantUuid::new();
        let factory = FakeClientFactory::default();
        let mappings = Arc::new(MemoryMappings::default());
        mappings.seed(tenant, EntityType::Product, "E-1", "P1");
        factory
            .ecommerce
            .add_order(ecommerce_order("O1", "buyer-1", &["E-1"]));

        let result = processor(&factory, &mappings, None)
            .process(&order_job(tenant, "O1"))
            .await;

        assert!(
            matches!(
                result,
                Err(SyncError::Translation(TranslationError::UnmappedCustomer { .. }))
            ),
            "expected UnmappedCustomer, got {result:?}"
        );
        assert!(factory.erp.orders().is_empty());
    }

    #[tokio::test]
    async fn missing_credentials_are_a_configuration_error() {
        let tenant = TenantUuid::new();
        let mappings = Arc::new(MemoryMappings::default());
        let processor = OrderProcessor::new(
            ClientResolver::new(
                Arc::new(MemoryCredentials::missing(
                    crate::domain::credentials::records::CredentialKind::ErpAppSecret,
                )),
                Arc::new(FakeClientFactory::default()),
            ),
            mappings,
            None,
        );

        let result = processor.process(&order_job(tenant, "O1")).await;

        assert!(
            matches!(&result, Err(SyncError::Configuration(_))),
            "expected Configuration, got {result:?}"
        );
        assert!(result.is_err_and(|error| !error.is_retryable()));
    }
}

//! Incremental pulls from the ERP

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use crate::{
    domain::{
        cursors::{
            CursorValue, SyncCursorsService,
            data::{AdvanceOutcome, CursorAdvance},
        },
        entities::EntityType,
        mappings::{MappingsService, OptionalMapping, data::NewMapping},
        tenants::records::TenantUuid,
    },
    engine::{
        JobPayload, ProcessOutcome, SyncError, WorkItem,
        processors::{ClaimedJob, ClientResolver, Processor, TenantClients},
    },
    platforms::{
        PlatformError,
        erp::models::{ErpCustomer, ErpProduct},
    },
    translation,
};

/// Default page size for ERP list calls.
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// One record pulled from the ERP.
enum SourceRecord {
    Product(ErpProduct),
    Customer(ErpCustomer),
}

impl SourceRecord {
    /// Native id, the watermark the cursor tracks.
    fn native_id(&self) -> &str {
        match self {
            Self::Product(product) => &product.id,
            Self::Customer(customer) => &customer.id,
        }
    }

    /// Key the mapping is stored under on the ERP side.
    fn erp_key(&self) -> &str {
        match self {
            Self::Product(product) => &product.code,
            Self::Customer(customer) => &customer.code,
        }
    }
}

struct SourcePage {
    records: Vec<SourceRecord>,
    total_pages: u32,
}

/// Pulls one page of ERP records, creating whatever is not mapped yet.
///
/// Records are handled in ascending native-id order. The cursor is written only after
/// every record on the page is mapped; the first failure aborts the page without
/// touching the cursor, so a retry revisits everything after the stored watermark.
#[derive(Clone)]
pub struct CursorSyncProcessor {
    clients: ClientResolver,
    mappings: Arc<dyn MappingsService>,
    cursors: Arc<dyn SyncCursorsService>,
    page_size: u32,
}

impl std::fmt::Debug for CursorSyncProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CursorSyncProcessor")
            .field("clients", &self.clients)
            .field("page_size", &self.page_size)
            .finish_non_exhaustive()
    }
}

impl CursorSyncProcessor {
    #[must_use]
    pub fn new(
        clients: ClientResolver,
        mappings: Arc<dyn MappingsService>,
        cursors: Arc<dyn SyncCursorsService>,
        page_size: u32,
    ) -> Self {
        Self {
            clients,
            mappings,
            cursors,
            page_size: page_size.max(1),
        }
    }

    async fn fetch(
        &self,
        clients: &TenantClients,
        entity_type: EntityType,
        page: u32,
    ) -> Result<SourcePage, SyncError> {
        match entity_type {
            EntityType::Product => {
                let listed = clients.erp.list_products(page, self.page_size).await?;

                Ok(SourcePage {
                    records: listed.records.into_iter().map(SourceRecord::Product).collect(),
                    total_pages: listed.total_pages,
                })
            }
            EntityType::Customer => {
                let listed = clients.erp.list_customers(page, self.page_size).await?;

                Ok(SourcePage {
                    records: listed
                        .records
                        .into_iter()
                        .map(SourceRecord::Customer)
                        .collect(),
                    total_pages: listed.total_pages,
                })
            }
            other => Err(SyncError::InvalidPayload(format!(
                "cursor sync is not supported for {other}"
            ))),
        }
    }

    /// Create one record on the e-commerce side and map it. Returns its e-commerce id.
    async fn replicate(
        &self,
        tenant: TenantUuid,
        clients: &TenantClients,
        entity_type: EntityType,
        record: &SourceRecord,
    ) -> Result<String, SyncError> {
        let (ecommerce_id, metadata) = match record {
            SourceRecord::Product(product) => {
                let translated = translation::erp_product_to_ecommerce(product, None)?;
                let stored = clients.ecommerce.upsert_product(&translated).await?;

                (stored.id.clone(), translation::snapshot(&stored, product))
            }
            SourceRecord::Customer(customer) => {
                let translated = translation::erp_customer_to_ecommerce(customer, None)?;
                let stored = clients.ecommerce.upsert_customer(&translated).await?;

                (stored.id.clone(), translation::snapshot(&stored, customer))
            }
        };

        let ecommerce_id = ecommerce_id.ok_or(PlatformError::MissingData {
            platform: "ecommerce",
        })?;

        self.mappings
            .upsert_by_erp_id(
                tenant,
                NewMapping {
                    entity_type,
                    ecommerce_id: ecommerce_id.clone(),
                    erp_id: record.erp_key().to_string(),
                    metadata,
                },
            )
            .await?;

        Ok(ecommerce_id)
    }
}

#[derive(Debug, Default)]
struct PageSummary {
    page: u32,
    listed: usize,
    created: usize,
    skipped: usize,
    last_sync_id: Option<String>,
    cursor_advanced: bool,
    next_page: Option<u32>,
}

impl PageSummary {
    fn to_json(&self) -> Value {
        json!({
            "page": self.page,
            "listed": self.listed,
            "created": self.created,
            "skipped": self.skipped,
            "last_sync_id": self.last_sync_id,
            "cursor_advanced": self.cursor_advanced,
            "next_page": self.next_page,
        })
    }
}

#[async_trait]
impl Processor for CursorSyncProcessor {
    async fn process(&self, job: &ClaimedJob) -> Result<ProcessOutcome, SyncError> {
        let JobPayload::CursorSync { entity_type, page } = job.payload else {
            return Err(SyncError::InvalidPayload(
                "cursor-sync processor received another job kind".to_string(),
            ));
        };

        let tenant = job.tenant;

        let watermark = self
            .cursors
            .get_cursor(tenant, entity_type)
            .await?
            .last_sync_id;

        let clients = self.clients.resolve(tenant).await?;
        let SourcePage {
            mut records,
            total_pages,
        } = self.fetch(&clients, entity_type, page).await?;

        let full_page = u32::try_from(records.len()).unwrap_or(u32::MAX) >= self.page_size;

        let mut summary = PageSummary {
            page,
            listed: records.len(),
            ..PageSummary::default()
        };

        records.sort_by_key(|record| CursorValue::from(record.native_id()));

        let mut local_cursor: Option<CursorValue> = None;

        for record in records
            .iter()
            .filter(|record| CursorValue::from(record.native_id()).is_after(watermark.as_ref()))
        {
            let mapped = self
                .mappings
                .find_by_erp_id(tenant, entity_type, record.erp_key())
                .await
                .optional()?;

            if mapped.is_some() {
                summary.skipped += 1;
            } else {
                self.replicate(tenant, &clients, entity_type, record)
                    .await
                    .inspect_err(|error| {
                        warn!(
                            %tenant,
                            %entity_type,
                            native_id = record.native_id(),
                            error = %error.report(),
                            "cursor sync stopped at failing record"
                        );
                    })?;

                summary.created += 1;
            }

            local_cursor = Some(CursorValue::from(record.native_id()));
        }

        if let Some(last_sync_id) = local_cursor {
            let outcome = self
                .cursors
                .advance_cursor(
                    tenant,
                    entity_type,
                    CursorAdvance {
                        last_sync_id: last_sync_id.clone(),
                        metadata: json!({
                            "page": page,
                            "created": summary.created,
                            "skipped": summary.skipped,
                        }),
                    },
                )
                .await?;

            summary.cursor_advanced = matches!(outcome, AdvanceOutcome::Advanced(_));
            summary.last_sync_id = Some(last_sync_id.into_string());
        }

        let mut follow_up = Vec::new();

        if full_page && page < total_pages {
            summary.next_page = Some(page + 1);
            follow_up.push(WorkItem::cursor_sync(tenant, entity_type, page + 1));
        }

        if summary.created > 0 || summary.cursor_advanced {
            info!(
                %tenant,
                %entity_type,
                page,
                created = summary.created,
                skipped = summary.skipped,
                "cursor sync page applied"
            );
        } else {
            debug!(%tenant, %entity_type, page, "cursor sync found nothing new");
        }

        Ok(ProcessOutcome {
            result: summary.to_json(),
            follow_up,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use testresult::TestResult;

    use super::*;
    use crate::{
        domain::jobs::records::{JobUuid, Operation},
        test::{
            fakes::{FakeClientFactory, erp_product},
            memory::{MemoryCredentials, MemoryCursors, MemoryMappings},
        },
    };

    struct Harness {
        tenant: TenantUuid,
        factory: FakeClientFactory,
        mappings: Arc<MemoryMappings>,
        cursors: Arc<MemoryCursors>,
        processor: CursorSyncProcessor,
    }

    fn harness(start: Option<&str>, page_size: u32) -> Harness {
        let tenant = TenantUuid::new();
        let factory = FakeClientFactory::default();
        let mappings = Arc::new(MemoryMappings::default());
        let cursors = Arc::new(MemoryCursors::provisioned(tenant, start));

        let processor = CursorSyncProcessor::new(
            ClientResolver::new(
                Arc::new(MemoryCredentials::complete()),
                Arc::new(factory.clone()),
            ),
            mappings.clone(),
            cursors.clone(),
            page_size,
        );

        Harness {
            tenant,
            factory,
            mappings,
            cursors,
            processor,
        }
    }

    fn sync_job(tenant: TenantUuid, entity_type: EntityType, page: u32) -> ClaimedJob {
        ClaimedJob {
            uuid: JobUuid::new(),
            tenant,
            operation: Operation::Sync,
            attempt: 1,
            payload: JobPayload::CursorSync { entity_type, page },
        }
    }

    #[tokio::test]
    async fn maps_every_new_product_and_advances_to_the_last() -> TestResult {
        let h = harness(Some("0"), DEFAULT_PAGE_SIZE);
        h.factory.erp.add_product(erp_product("P2", "P2"));
        h.factory.erp.add_product(erp_product("P1", "P1"));

        let outcome = h
            .processor
            .process(&sync_job(h.tenant, EntityType::Product, 1))
            .await?;

        assert_eq!(outcome.result["created"], 2);
        assert_eq!(h.mappings.count(EntityType::Product), 2);
        assert_eq!(
            h.cursors.value(h.tenant, EntityType::Product).as_deref(),
            Some("P2")
        );
        assert!(outcome.follow_up.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn resync_after_catching_up_maps_nothing() -> TestResult {
        let h = harness(Some("0"), DEFAULT_PAGE_SIZE);
        h.factory.erp.add_product(erp_product("P1", "P1"));
        h.factory.erp.add_product(erp_product("P2", "P2"));

        h.processor
            .process(&sync_job(h.tenant, EntityType::Product, 1))
            .await?;
        let again = h
            .processor
            .process(&sync_job(h.tenant, EntityType::Product, 1))
            .await?;

        assert_eq!(again.result["created"], 0);
        assert_eq!(again.result["cursor_advanced"], false);
        assert_eq!(h.mappings.count(EntityType::Product), 2);
        assert_eq!(h.factory.ecommerce.products().len(), 2);
        assert_eq!(h.cursors.writes().len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn failing_record_leaves_cursor_untouched() -> TestResult {
        let h = harness(Some("0"), DEFAULT_PAGE_SIZE);
        for code in ["P1", "P2", "P3"] {
            h.factory.erp.add_product(erp_product(code, code));
        }
        h.factory.ecommerce.fail_sku("P2");

        let result = h
            .processor
            .process(&sync_job(h.tenant, EntityType::Product, 1))
            .await;

        assert!(
            matches!(&result, Err(error) if error.is_retryable()),
            "expected a retryable failure, got {result:?}"
        );
        assert_eq!(h.mappings.count(EntityType::Product), 1);
        assert_eq!(
            h.cursors.value(h.tenant, EntityType::Product).as_deref(),
            Some("0")
        );
        assert!(h.cursors.writes().is_empty());

        h.factory.ecommerce.heal();

        let retried = h
            .processor
            .process(&sync_job(h.tenant, EntityType::Product, 1))
            .await?;

        assert_eq!(retried.result["created"], 2);
        assert_eq!(retried.result["skipped"], 1);
        assert_eq!(h.mappings.count(EntityType::Product), 3);
        assert_eq!(
            h.cursors.value(h.tenant, EntityType::Product).as_deref(),
            Some("P3")
        );

        Ok(())
    }

    #[tokio::test]
    async fn numeric_ids_advance_in_numeric_order() -> TestResult {
        let h = harness(None, DEFAULT_PAGE_SIZE);
        for (id, code) in [("10", "A"), ("9", "B"), ("100", "C")] {
            h.factory.erp.add_product(erp_product(id, code));
        }

        h.processor
            .process(&sync_job(h.tenant, EntityType::Product, 1))
            .await?;

        assert_eq!(
            h.cursors.value(h.tenant, EntityType::Product).as_deref(),
            Some("100")
        );

        Ok(())
    }

    #[tokio::test]
    async fn full_page_queues_the_next_one() -> TestResult {
        let h = harness(None, 2);
        for code in ["P1", "P2", "P3"] {
            h.factory.erp.add_product(erp_product(code, code));
        }

        let outcome = h
            .processor
            .process(&sync_job(h.tenant, EntityType::Product, 1))
            .await?;

        assert_eq!(
            outcome.follow_up,
            vec![WorkItem::cursor_sync(h.tenant, EntityType::Product, 2)]
        );

        let last = h
            .processor
            .process(&sync_job(h.tenant, EntityType::Product, 2))
            .await?;

        assert!(last.follow_up.is_empty());
        assert_eq!(h.mappings.count(EntityType::Product), 3);
        assert_eq!(
            h.cursors.value(h.tenant, EntityType::Product).as_deref(),
            Some("P3")
        );

        Ok(())
    }

    #[tokio::test]
    async fn products_mapped_elsewhere_are_skipped_but_still_advance() -> TestResult {
        let h = harness(None, DEFAULT_PAGE_SIZE);
        h.factory.erp.add_product(erp_product("P1", "P1"));
        h.mappings
            .seed(h.tenant, EntityType::Product, "E-77", "P1");

        let outcome = h
            .processor
            .process(&sync_job(h.tenant, EntityType::Product, 1))
            .await?;

        assert_eq!(outcome.result["skipped"], 1);
        assert!(h.factory.ecommerce.products().is_empty());
        assert_eq!(
            h.cursors.value(h.tenant, EntityType::Product).as_deref(),
            Some("P1")
        );

        Ok(())
    }

    #[tokio::test]
    async fn unsupported_entity_type_is_rejected() {
        let h = harness(None, DEFAULT_PAGE_SIZE);

        let result = h
            .processor
            .process(&sync_job(h.tenant, EntityType::Invoice, 1))
            .await;

        assert!(
            matches!(result, Err(SyncError::InvalidPayload(_))),
            "expected InvalidPayload, got {result:?}"
        );
    }
}

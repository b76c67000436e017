//! Webhook events service.

use async_trait::async_trait;
use mockall::automock;

use crate::{
    database::Db,
    domain::{
        tenants::records::TenantUuid,
        webhooks::{
            data::NewWebhookEvent,
            errors::WebhookEventsServiceError,
            records::{WebhookEventRecord, WebhookEventUuid},
            repository::PgWebhookEventsRepository,
        },
    },
};

#[derive(Debug, Clone)]
pub struct PgWebhookEventsService {
    db: Db,
    repository: PgWebhookEventsRepository,
}

impl PgWebhookEventsService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            repository: PgWebhookEventsRepository::new(),
        }
    }
}

#[async_trait]
impl WebhookEventsService for PgWebhookEventsService {
    async fn record(
        &self,
        tenant: TenantUuid,
        event: NewWebhookEvent,
    ) -> Result<WebhookEventRecord, WebhookEventsServiceError> {
        let mut tx = self.db.begin_tenant_transaction(tenant).await?;

        let record = self.repository.record_event(&mut tx, tenant, event).await?;

        tx.commit().await?;

        Ok(record)
    }

    async fn mark_processed(
        &self,
        tenant: TenantUuid,
        event: WebhookEventUuid,
    ) -> Result<WebhookEventRecord, WebhookEventsServiceError> {
        let mut tx = self.db.begin_tenant_transaction(tenant).await?;

        let record = self.repository.mark_processed(&mut tx, event).await?;

        tx.commit().await?;

        Ok(record)
    }

    async fn mark_failed(
        &self,
        tenant: TenantUuid,
        event: WebhookEventUuid,
        error: String,
    ) -> Result<WebhookEventRecord, WebhookEventsServiceError> {
        let mut tx = self.db.begin_tenant_transaction(tenant).await?;

        let record = self.repository.mark_failed(&mut tx, event, &error).await?;

        tx.commit().await?;

        Ok(record)
    }

    async fn mark_rejected(
        &self,
        tenant: TenantUuid,
        event: WebhookEventUuid,
        error: String,
    ) -> Result<WebhookEventRecord, WebhookEventsServiceError> {
        let mut tx = self.db.begin_tenant_transaction(tenant).await?;

        let record = self.repository.mark_rejected(&mut tx, event, &error).await?;

        tx.commit().await?;

        Ok(record)
    }

    async fn list_unprocessed(
        &self,
        tenant: TenantUuid,
        limit: u32,
    ) -> Result<Vec<WebhookEventRecord>, WebhookEventsServiceError> {
        let mut tx = self.db.begin_tenant_transaction(tenant).await?;

        let records = self.repository.list_unprocessed(&mut tx, limit).await?;

        tx.commit().await?;

        Ok(records)
    }
}

#[automock]
#[async_trait]
pub trait WebhookEventsService: Send + Sync {
    /// Persist an inbound notification as unprocessed.
    async fn record(
        &self,
        tenant: TenantUuid,
        event: NewWebhookEvent,
    ) -> Result<WebhookEventRecord, WebhookEventsServiceError>;

    /// Flag an event once its derived jobs are enqueued.
    async fn mark_processed(
        &self,
        tenant: TenantUuid,
        event: WebhookEventUuid,
    ) -> Result<WebhookEventRecord, WebhookEventsServiceError>;

    /// Attach an error to an event whose jobs could not be enqueued; it stays unprocessed
    /// and is replayed later.
    async fn mark_failed(
        &self,
        tenant: TenantUuid,
        event: WebhookEventUuid,
        error: String,
    ) -> Result<WebhookEventRecord, WebhookEventsServiceError>;

    /// Settle an event that can never yield work. It keeps the error and is not replayed.
    async fn mark_rejected(
        &self,
        tenant: TenantUuid,
        event: WebhookEventUuid,
        error: String,
    ) -> Result<WebhookEventRecord, WebhookEventsServiceError>;

    /// Oldest replayable events first: unprocessed and not rejected.
    async fn list_unprocessed(
        &self,
        tenant: TenantUuid,
        limit: u32,
    ) -> Result<Vec<WebhookEventRecord>, WebhookEventsServiceError>;
}

//! Webhook Events Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query_as};

use crate::domain::{
    tenants::records::TenantUuid,
    webhooks::{
        data::NewWebhookEvent,
        records::{WebhookEventRecord, WebhookEventUuid},
    },
};

const RECORD_EVENT_SQL: &str = include_str!("sql/record_event.sql");
const MARK_PROCESSED_SQL: &str = include_str!("sql/mark_processed.sql");
const MARK_FAILED_SQL: &str = include_str!("sql/mark_failed.sql");
const MARK_REJECTED_SQL: &str = include_str!("sql/mark_rejected.sql");
const LIST_UNPROCESSED_SQL: &str = include_str!("sql/list_unprocessed.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgWebhookEventsRepository;

impl PgWebhookEventsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn record_event(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        tenant: TenantUuid,
        event: NewWebhookEvent,
    ) -> Result<WebhookEventRecord, sqlx::Error> {
        query_as::<Postgres, WebhookEventRecord>(RECORD_EVENT_SQL)
            .bind(WebhookEventUuid::new().into_uuid())
            .bind(tenant.into_uuid())
            .bind(event.source.as_str())
            .bind(event.event_type)
            .bind(event.payload)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn mark_processed(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        event: WebhookEventUuid,
    ) -> Result<WebhookEventRecord, sqlx::Error> {
        query_as::<Postgres, WebhookEventRecord>(MARK_PROCESSED_SQL)
            .bind(event.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn mark_failed(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        event: WebhookEventUuid,
        error: &str,
    ) -> Result<WebhookEventRecord, sqlx::Error> {
        query_as::<Postgres, WebhookEventRecord>(MARK_FAILED_SQL)
            .bind(event.into_uuid())
            .bind(error)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn mark_rejected(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        event: WebhookEventUuid,
        error: &str,
    ) -> Result<WebhookEventRecord, sqlx::Error> {
        query_as::<Postgres, WebhookEventRecord>(MARK_REJECTED_SQL)
            .bind(event.into_uuid())
            .bind(error)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn list_unprocessed(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        limit: u32,
    ) -> Result<Vec<WebhookEventRecord>, sqlx::Error> {
        query_as::<Postgres, WebhookEventRecord>(LIST_UNPROCESSED_SQL)
            .bind(i64::from(limit))
            .fetch_all(&mut **tx)
            .await
    }
}

impl<'r> FromRow<'r, PgRow> for WebhookEventRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let source: String = row.try_get("source")?;

        Ok(Self {
            uuid: WebhookEventUuid::from_uuid(row.try_get("uuid")?),
            tenant_uuid: TenantUuid::from_uuid(row.try_get("tenant_uuid")?),
            source: source.parse().map_err(|error| sqlx::Error::ColumnDecode {
                index: "source".to_string(),
                source: Box::new(error),
            })?,
            event_type: row.try_get("event_type")?,
            payload: row.try_get("payload")?,
            processed: row.try_get("processed")?,
            processed_at: row
                .try_get::<Option<SqlxTimestamp>, _>("processed_at")?
                .map(SqlxTimestamp::to_jiff),
            rejected_at: row
                .try_get::<Option<SqlxTimestamp>, _>("rejected_at")?
                .map(SqlxTimestamp::to_jiff),
            error: row.try_get("error")?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
        })
    }
}

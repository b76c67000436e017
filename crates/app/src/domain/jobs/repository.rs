//! Job Queue Repository

use std::time::Duration;

use jiff::Timestamp;
use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query_as};

use crate::domain::{
    entities::EntityType,
    jobs::{
        RetryPolicy,
        data::NewJob,
        records::{JobRecord, JobStatus, JobUuid, Queue},
    },
    tenants::records::TenantUuid,
};

const ENQUEUE_JOB_SQL: &str = include_str!("sql/enqueue_job.sql");
const FIND_BY_SOURCE_EVENT_SQL: &str = include_str!("sql/find_by_source_event.sql");
const GET_JOB_SQL: &str = include_str!("sql/get_job.sql");
const CLAIM_JOB_SQL: &str = include_str!("sql/claim_job.sql");
const COMPLETE_JOB_SQL: &str = include_str!("sql/complete_job.sql");
const RETRY_JOB_SQL: &str = include_str!("sql/retry_job.sql");
const FAIL_JOB_SQL: &str = include_str!("sql/fail_job.sql");
const LIST_JOBS_SQL: &str = include_str!("sql/list_jobs.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgJobQueueRepository;

impl PgJobQueueRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    /// Insert a job; `None` when the source event id is already queued.
    pub(crate) async fn enqueue_job(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        tenant: TenantUuid,
        job: NewJob,
    ) -> Result<Option<JobRecord>, sqlx::Error> {
        query_as::<Postgres, JobRecord>(ENQUEUE_JOB_SQL)
            .bind(job.uuid.into_uuid())
            .bind(tenant.into_uuid())
            .bind(job.queue.as_str())
            .bind(job.entity_type.as_str())
            .bind(job.operation.as_str())
            .bind(job.source_event_id)
            .bind(job.payload)
            .bind(i32::try_from(job.retry_policy.max_attempts).unwrap_or(i32::MAX))
            .bind(millis(job.retry_policy.base_delay))
            .bind(millis(job.retry_policy.max_delay))
            .fetch_optional(&mut **tx)
            .await
    }

    pub(crate) async fn find_by_source_event(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        tenant: TenantUuid,
        entity_type: EntityType,
        source_event_id: &str,
    ) -> Result<JobRecord, sqlx::Error> {
        query_as::<Postgres, JobRecord>(FIND_BY_SOURCE_EVENT_SQL)
            .bind(tenant.into_uuid())
            .bind(entity_type.as_str())
            .bind(source_event_id)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn get_job(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        job: JobUuid,
    ) -> Result<JobRecord, sqlx::Error> {
        query_as::<Postgres, JobRecord>(GET_JOB_SQL)
            .bind(job.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn claim_job(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        queue: Queue,
        lease: Duration,
    ) -> Result<Option<JobRecord>, sqlx::Error> {
        query_as::<Postgres, JobRecord>(CLAIM_JOB_SQL)
            .bind(queue.as_str())
            .bind(lease.as_secs_f64())
            .fetch_optional(&mut **tx)
            .await
    }

    pub(crate) async fn complete_job(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        job: JobUuid,
        attempt: u32,
    ) -> Result<JobRecord, sqlx::Error> {
        query_as::<Postgres, JobRecord>(COMPLETE_JOB_SQL)
            .bind(job.into_uuid())
            .bind(attempt_number(attempt))
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn retry_job(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        job: JobUuid,
        attempt: u32,
        available_at: Timestamp,
        error: &str,
    ) -> Result<JobRecord, sqlx::Error> {
        query_as::<Postgres, JobRecord>(RETRY_JOB_SQL)
            .bind(job.into_uuid())
            .bind(SqlxTimestamp::from(available_at))
            .bind(error)
            .bind(attempt_number(attempt))
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn fail_job(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        job: JobUuid,
        attempt: u32,
        error: &str,
    ) -> Result<JobRecord, sqlx::Error> {
        query_as::<Postgres, JobRecord>(FAIL_JOB_SQL)
            .bind(job.into_uuid())
            .bind(error)
            .bind(attempt_number(attempt))
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn list_jobs(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        tenant: TenantUuid,
        status: Option<JobStatus>,
        limit: u32,
    ) -> Result<Vec<JobRecord>, sqlx::Error> {
        query_as::<Postgres, JobRecord>(LIST_JOBS_SQL)
            .bind(tenant.into_uuid())
            .bind(status.map(JobStatus::as_str))
            .bind(i64::from(limit))
            .fetch_all(&mut **tx)
            .await
    }
}

fn millis(duration: Duration) -> i64 {
    i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
}

fn attempt_number(attempt: u32) -> i32 {
    i32::try_from(attempt).unwrap_or(i32::MAX)
}

fn decode_error(column: &str, error: impl std::error::Error + Send + Sync + 'static) -> sqlx::Error {
    sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(error),
    }
}

fn non_negative(row: &PgRow, column: &str) -> sqlx::Result<u64> {
    let value: i64 = row.try_get(column)?;

    u64::try_from(value).map_err(|error| decode_error(column, error))
}

impl<'r> FromRow<'r, PgRow> for JobRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let queue: String = row.try_get("queue")?;
        let operation: String = row.try_get("operation")?;
        let status: String = row.try_get("status")?;
        let attempts: i32 = row.try_get("attempts")?;
        let max_attempts: i32 = row.try_get("max_attempts")?;

        Ok(Self {
            uuid: JobUuid::from_uuid(row.try_get("uuid")?),
            tenant_uuid: TenantUuid::from_uuid(row.try_get("tenant_uuid")?),
            queue: queue.parse().map_err(|error| decode_error("queue", error))?,
            entity_type: EntityType::decode(row, "entity_type")?,
            operation: operation
                .parse()
                .map_err(|error| decode_error("operation", error))?,
            source_event_id: row.try_get("source_event_id")?,
            payload: row.try_get("payload")?,
            status: status.parse().map_err(|error| decode_error("status", error))?,
            attempts: u32::try_from(attempts).map_err(|error| decode_error("attempts", error))?,
            retry_policy: RetryPolicy {
                max_attempts: u32::try_from(max_attempts)
                    .map_err(|error| decode_error("max_attempts", error))?,
                base_delay: Duration::from_millis(non_negative(row, "backoff_base_ms")?),
                max_delay: Duration::from_millis(non_negative(row, "backoff_max_ms")?),
            },
            available_at: row.try_get::<SqlxTimestamp, _>("available_at")?.to_jiff(),
            lease_expires_at: row
                .try_get::<Option<SqlxTimestamp>, _>("lease_expires_at")?
                .map(SqlxTimestamp::to_jiff),
            last_error: row.try_get("last_error")?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}

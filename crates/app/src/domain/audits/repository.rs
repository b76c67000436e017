//! Job Audits Repository

use jiff::Timestamp;
use jiff_sqlx::Timestamp as SqlxTimestamp;
use serde_json::Value;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query_as};

use crate::domain::{
    audits::{
        data::{AuditQuery, NewJobAudit},
        records::{JobAuditRecord, JobAuditUuid},
    },
    jobs::records::{JobStatus, JobUuid},
    tenants::records::TenantUuid,
};

const START_ATTEMPT_SQL: &str = include_str!("sql/start_attempt.sql");
const COMPLETE_ATTEMPT_SQL: &str = include_str!("sql/complete_attempt.sql");
const FAIL_ATTEMPT_SQL: &str = include_str!("sql/fail_attempt.sql");
const GET_AUDIT_SQL: &str = include_str!("sql/get_audit.sql");
const QUERY_AUDITS_SQL: &str = include_str!("sql/query_audits.sql");
const LIST_ORPHANED_SQL: &str = include_str!("sql/list_orphaned.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgJobAuditsRepository;

impl PgJobAuditsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn start_attempt(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        tenant: TenantUuid,
        audit: NewJobAudit,
    ) -> Result<JobAuditRecord, sqlx::Error> {
        query_as::<Postgres, JobAuditRecord>(START_ATTEMPT_SQL)
            .bind(JobAuditUuid::new().into_uuid())
            .bind(tenant.into_uuid())
            .bind(audit.job_uuid.into_uuid())
            .bind(i32::try_from(audit.attempt).unwrap_or(i32::MAX))
            .bind(audit.job_type)
            .bind(audit.payload)
            .bind(SqlxTimestamp::from(audit.started_at))
            .fetch_one(&mut **tx)
            .await
    }

    /// Settle as completed; `None` when the row is missing or already settled.
    pub(crate) async fn complete_attempt(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        audit: JobAuditUuid,
        result: Value,
    ) -> Result<Option<JobAuditRecord>, sqlx::Error> {
        query_as::<Postgres, JobAuditRecord>(COMPLETE_ATTEMPT_SQL)
            .bind(audit.into_uuid())
            .bind(result)
            .fetch_optional(&mut **tx)
            .await
    }

    /// Settle as failed; `None` when the row is missing or already settled.
    pub(crate) async fn fail_attempt(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        audit: JobAuditUuid,
        error: &str,
    ) -> Result<Option<JobAuditRecord>, sqlx::Error> {
        query_as::<Postgres, JobAuditRecord>(FAIL_ATTEMPT_SQL)
            .bind(audit.into_uuid())
            .bind(error)
            .fetch_optional(&mut **tx)
            .await
    }

    pub(crate) async fn get_audit(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        audit: JobAuditUuid,
    ) -> Result<JobAuditRecord, sqlx::Error> {
        query_as::<Postgres, JobAuditRecord>(GET_AUDIT_SQL)
            .bind(audit.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn query_audits(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        query: AuditQuery,
    ) -> Result<Vec<JobAuditRecord>, sqlx::Error> {
        query_as::<Postgres, JobAuditRecord>(QUERY_AUDITS_SQL)
            .bind(query.job.map(JobUuid::into_uuid))
            .bind(query.status.map(JobStatus::as_str))
            .bind(query.started_from.map(SqlxTimestamp::from))
            .bind(query.started_before.map(SqlxTimestamp::from))
            .bind(i64::from(query.limit))
            .fetch_all(&mut **tx)
            .await
    }

    pub(crate) async fn list_orphaned(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        started_before: Timestamp,
    ) -> Result<Vec<JobAuditRecord>, sqlx::Error> {
        query_as::<Postgres, JobAuditRecord>(LIST_ORPHANED_SQL)
            .bind(SqlxTimestamp::from(started_before))
            .fetch_all(&mut **tx)
            .await
    }
}

impl<'r> FromRow<'r, PgRow> for JobAuditRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let attempt: i32 = row.try_get("attempt")?;
        let status: String = row.try_get("status")?;
        let decode = |index: &str, source: Box<dyn std::error::Error + Send + Sync>| {
            sqlx::Error::ColumnDecode {
                index: index.to_string(),
                source,
            }
        };

        Ok(Self {
            uuid: JobAuditUuid::from_uuid(row.try_get("uuid")?),
            tenant_uuid: TenantUuid::from_uuid(row.try_get("tenant_uuid")?),
            job_uuid: JobUuid::from_uuid(row.try_get("job_uuid")?),
            attempt: u32::try_from(attempt).map_err(|error| decode("attempt", Box::new(error)))?,
            job_type: row.try_get("job_type")?,
            status: status
                .parse()
                .map_err(|error| decode("status", Box::new(error)))?,
            payload: row.try_get("payload")?,
            result: row.try_get("result")?,
            error: row.try_get("error")?,
            started_at: row.try_get::<SqlxTimestamp, _>("started_at")?.to_jiff(),
            completed_at: row
                .try_get::<Option<SqlxTimestamp>, _>("completed_at")?
                .map(SqlxTimestamp::to_jiff),
            duration_ms: row
                .try_get::<Option<i64>, _>("duration_ms")?
                .map(|millis| u64::try_from(millis).unwrap_or_default()),
        })
    }
}

//! Job audits service.

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use serde_json::Value;

use crate::{
    database::Db,
    domain::{
        audits::{
            data::{AuditQuery, NewJobAudit},
            errors::JobAuditsServiceError,
            records::{JobAuditRecord, JobAuditUuid},
            repository::PgJobAuditsRepository,
        },
        tenants::records::TenantUuid,
    },
};

#[derive(Debug, Clone)]
pub struct PgJobAuditsService {
    db: Db,
    repository: PgJobAuditsRepository,
}

impl PgJobAuditsService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            repository: PgJobAuditsRepository::new(),
        }
    }
}

#[async_trait]
impl JobAuditsService for PgJobAuditsService {
    async fn start_attempt(
        &self,
        tenant: TenantUuid,
        audit: NewJobAudit,
    ) -> Result<JobAuditRecord, JobAuditsServiceError> {
        let mut tx = self.db.begin_tenant_transaction(tenant).await?;

        let record = self.repository.start_attempt(&mut tx, tenant, audit).await?;

        tx.commit().await?;

        Ok(record)
    }

    async fn complete_attempt(
        &self,
        tenant: TenantUuid,
        audit: JobAuditUuid,
        result: Value,
    ) -> Result<JobAuditRecord, JobAuditsServiceError> {
        let mut tx = self.db.begin_tenant_transaction(tenant).await?;

        let Some(record) = self
            .repository
            .complete_attempt(&mut tx, audit, result)
            .await?
        else {
            self.repository.get_audit(&mut tx, audit).await?;

            return Err(JobAuditsServiceError::AlreadySettled);
        };

        tx.commit().await?;

        Ok(record)
    }

    async fn fail_attempt(
        &self,
        tenant: TenantUuid,
        audit: JobAuditUuid,
        error: String,
    ) -> Result<JobAuditRecord, JobAuditsServiceError> {
        let mut tx = self.db.begin_tenant_transaction(tenant).await?;

        let Some(record) = self
            .repository
            .fail_attempt(&mut tx, audit, &error)
            .await?
        else {
            self.repository.get_audit(&mut tx, audit).await?;

            return Err(JobAuditsServiceError::AlreadySettled);
        };

        tx.commit().await?;

        Ok(record)
    }

    async fn query(
        &self,
        tenant: TenantUuid,
        query: AuditQuery,
    ) -> Result<Vec<JobAuditRecord>, JobAuditsServiceError> {
        let mut tx = self.db.begin_tenant_transaction(tenant).await?;

        let records = self.repository.query_audits(&mut tx, query).await?;

        tx.commit().await?;

        Ok(records)
    }

    async fn list_orphaned(
        &self,
        tenant: TenantUuid,
        started_before: Timestamp,
    ) -> Result<Vec<JobAuditRecord>, JobAuditsServiceError> {
        let mut tx = self.db.begin_tenant_transaction(tenant).await?;

        let records = self
            .repository
            .list_orphaned(&mut tx, started_before)
            .await?;

        tx.commit().await?;

        Ok(records)
    }
}

#[automock]
#[async_trait]
pub trait JobAuditsService: Send + Sync {
    /// Record a claimed attempt as `PROCESSING`.
    async fn start_attempt(
        &self,
        tenant: TenantUuid,
        audit: NewJobAudit,
    ) -> Result<JobAuditRecord, JobAuditsServiceError>;

    /// Settle an attempt as `COMPLETED` with its result.
    ///
    /// Fails with [`JobAuditsServiceError::AlreadySettled`] when the row is terminal.
    async fn complete_attempt(
        &self,
        tenant: TenantUuid,
        audit: JobAuditUuid,
        result: Value,
    ) -> Result<JobAuditRecord, JobAuditsServiceError>;

    /// Settle an attempt as `FAILED` with its error.
    async fn fail_attempt(
        &self,
        tenant: TenantUuid,
        audit: JobAuditUuid,
        error: String,
    ) -> Result<JobAuditRecord, JobAuditsServiceError>;

    /// Filter audit rows by job, status and start time, newest first.
    async fn query(
        &self,
        tenant: TenantUuid,
        query: AuditQuery,
    ) -> Result<Vec<JobAuditRecord>, JobAuditsServiceError>;

    /// Attempts still `PROCESSING` that started before `started_before`.
    async fn list_orphaned(
        &self,
        tenant: TenantUuid,
        started_before: Timestamp,
    ) -> Result<Vec<JobAuditRecord>, JobAuditsServiceError>;
}

#[cfg(test)]
mod tests {
    use jiff::ToSpan;
    use serde_json::json;
    use testresult::TestResult;

    use crate::{
        domain::jobs::records::{JobStatus, JobUuid},
        test::TestContext,
    };

    use super::*;

    fn attempt(job: JobUuid, attempt: u32) -> NewJobAudit {
        NewJobAudit {
            job_uuid: job,
            attempt,
            job_type: "order-sync".to_string(),
            payload: json!({ "order_id": "O1" }),
            started_at: Timestamp::now(),
        }
    }

    #[tokio::test]
    async fn attempt_lifecycle_processing_to_completed() -> TestResult {
        let ctx = TestContext::new().await;
        let job = JobUuid::new();

        let started = ctx
            .audits
            .start_attempt(ctx.tenant_uuid, attempt(job, 1))
            .await?;

        assert_eq!(started.status, JobStatus::Processing);

        let completed = ctx
            .audits
            .complete_attempt(ctx.tenant_uuid, started.uuid, json!({ "created": 1 }))
            .await?;

        assert_eq!(completed.status, JobStatus::Completed);
        assert!(completed.completed_at.is_some());
        assert!(completed.duration_ms.is_some());

        Ok(())
    }

    #[tokio::test]
    async fn settled_attempt_is_never_mutated_again() -> TestResult {
        let ctx = TestContext::new().await;

        let started = ctx
            .audits
            .start_attempt(ctx.tenant_uuid, attempt(JobUuid::new(), 1))
            .await?;

        ctx.audits
            .fail_attempt(ctx.tenant_uuid, started.uuid, "boom".to_string())
            .await?;

        let result = ctx
            .audits
            .complete_attempt(ctx.tenant_uuid, started.uuid, json!({}))
            .await;

        assert!(
            matches!(result, Err(JobAuditsServiceError::AlreadySettled)),
            "expected AlreadySettled, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn query_filters_by_job_and_status() -> TestResult {
        let ctx = TestContext::new().await;
        let job = JobUuid::new();

        let first = ctx
            .audits
            .start_attempt(ctx.tenant_uuid, attempt(job, 1))
            .await?;
        ctx.audits
            .fail_attempt(ctx.tenant_uuid, first.uuid, "timeout".to_string())
            .await?;
        ctx.audits
            .start_attempt(ctx.tenant_uuid, attempt(job, 2))
            .await?;
        ctx.audits
            .start_attempt(ctx.tenant_uuid, attempt(JobUuid::new(), 1))
            .await?;

        let for_job = ctx
            .audits
            .query(
                ctx.tenant_uuid,
                AuditQuery {
                    job: Some(job),
                    ..AuditQuery::default()
                },
            )
            .await?;

        assert_eq!(for_job.len(), 2);

        let failed = ctx
            .audits
            .query(
                ctx.tenant_uuid,
                AuditQuery {
                    status: Some(JobStatus::Failed),
                    ..AuditQuery::default()
                },
            )
            .await?;

        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].error.as_deref(), Some("timeout"));

        Ok(())
    }

    #[tokio::test]
    async fn duplicate_attempt_number_returns_already_exists() -> TestResult {
        let ctx = TestContext::new().await;
        let job = JobUuid::new();

        ctx.audits
            .start_attempt(ctx.tenant_uuid, attempt(job, 1))
            .await?;

        let result = ctx
            .audits
            .start_attempt(ctx.tenant_uuid, attempt(job, 1))
            .await;

        assert!(
            matches!(result, Err(JobAuditsServiceError::AlreadyExists)),
            "expected AlreadyExists, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn orphaned_attempts_are_reported() -> TestResult {
        let ctx = TestContext::new().await;

        let stale = ctx
            .audits
            .start_attempt(
                ctx.tenant_uuid,
                NewJobAudit {
                    started_at: Timestamp::now().checked_sub(2.hours())?,
                    ..attempt(JobUuid::new(), 1)
                },
            )
            .await?;
        ctx.audits
            .start_attempt(ctx.tenant_uuid, attempt(JobUuid::new(), 1))
            .await?;

        let orphaned = ctx
            .audits
            .list_orphaned(ctx.tenant_uuid, Timestamp::now().checked_sub(1.hour())?)
            .await?;

        assert_eq!(orphaned.len(), 1);
        assert_eq!(orphaned[0].uuid, stale.uuid);

        Ok(())
    }
}

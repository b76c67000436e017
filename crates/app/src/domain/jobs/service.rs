//! Job queue service.

use std::time::Duration;

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use sqlx::Error;
use tracing::debug;

use crate::{
    database::Db,
    domain::{
        jobs::{
            data::{EnqueueOutcome, NewJob},
            errors::JobQueueError,
            records::{JobRecord, JobStatus, JobUuid, Queue},
            repository::PgJobQueueRepository,
        },
        tenants::records::TenantUuid,
    },
};

#[derive(Debug, Clone)]
pub struct PgJobQueue {
    db: Db,
    repository: PgJobQueueRepository,
}

impl PgJobQueue {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            repository: PgJobQueueRepository::new(),
        }
    }
}

/// A settle that matched no row means the lease was lost to another worker.
fn lost_lease(error: Error) -> JobQueueError {
    match error {
        Error::RowNotFound => JobQueueError::NotProcessing,
        error => error.into(),
    }
}

#[async_trait]
impl JobQueue for PgJobQueue {
    async fn enqueue(
        &self,
        tenant: TenantUuid,
        job: NewJob,
    ) -> Result<EnqueueOutcome, JobQueueError> {
        let entity_type = job.entity_type;
        let source_event_id = job.source_event_id.clone();

        let mut tx = self.db.begin_system_transaction().await?;

        let inserted = self.repository.enqueue_job(&mut tx, tenant, job).await?;

        let outcome = match inserted {
            Some(job) => EnqueueOutcome::Enqueued(job),
            None => {
                let key = source_event_id.as_deref().ok_or(JobQueueError::InvalidData)?;

                let existing = self
                    .repository
                    .find_by_source_event(&mut tx, tenant, entity_type, key)
                    .await?;

                debug!(
                    %tenant,
                    job = %existing.uuid,
                    source_event_id = key,
                    "duplicate work item; keeping existing job"
                );

                EnqueueOutcome::Duplicate(existing)
            }
        };

        tx.commit().await?;

        Ok(outcome)
    }

    async fn claim(
        &self,
        queue: Queue,
        lease: Duration,
    ) -> Result<Option<JobRecord>, JobQueueError> {
        let mut tx = self.db.begin_system_transaction().await?;

        let claimed = self.repository.claim_job(&mut tx, queue, lease).await?;

        tx.commit().await?;

        Ok(claimed)
    }

    async fn complete(&self, job: JobUuid, attempt: u32) -> Result<JobRecord, JobQueueError> {
        let mut tx = self.db.begin_system_transaction().await?;

        let record = self
            .repository
            .complete_job(&mut tx, job, attempt)
            .await
            .map_err(lost_lease)?;

        tx.commit().await?;

        Ok(record)
    }

    async fn retry(
        &self,
        job: JobUuid,
        attempt: u32,
        available_at: Timestamp,
        error: String,
    ) -> Result<JobRecord, JobQueueError> {
        let mut tx = self.db.begin_system_transaction().await?;

        let record = self
            .repository
            .retry_job(&mut tx, job, attempt, available_at, &error)
            .await
            .map_err(lost_lease)?;

        tx.commit().await?;

        Ok(record)
    }

    async fn fail(
        &self,
        job: JobUuid,
        attempt: u32,
        error: String,
    ) -> Result<JobRecord, JobQueueError> {
        let mut tx = self.db.begin_system_transaction().await?;

        let record = self
            .repository
            .fail_job(&mut tx, job, attempt, &error)
            .await
            .map_err(lost_lease)?;

        tx.commit().await?;

        Ok(record)
    }

    async fn get_job(&self, job: JobUuid) -> Result<JobRecord, JobQueueError> {
        let mut tx = self.db.begin_system_transaction().await?;

        let record = self.repository.get_job(&mut tx, job).await?;

        tx.commit().await?;

        Ok(record)
    }

    async fn list_jobs(
        &self,
        tenant: TenantUuid,
        status: Option<JobStatus>,
        limit: u32,
    ) -> Result<Vec<JobRecord>, JobQueueError> {
        let mut tx = self.db.begin_system_transaction().await?;

        let jobs = self
            .repository
            .list_jobs(&mut tx, tenant, status, limit)
            .await?;

        tx.commit().await?;

        Ok(jobs)
    }
}

#[automock]
#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Enqueue a job, deduplicating on `(tenant, entity type, source event id)`.
    ///
    /// Jobs without a source event id are never deduplicated.
    async fn enqueue(
        &self,
        tenant: TenantUuid,
        job: NewJob,
    ) -> Result<EnqueueOutcome, JobQueueError>;

    /// Claim the next available job on `queue`, taking a visibility lease.
    ///
    /// Pending and retrying jobs whose `available_at` has passed are eligible, as are
    /// processing jobs whose lease expired. Claiming increments the attempt count.
    async fn claim(&self, queue: Queue, lease: Duration)
    -> Result<Option<JobRecord>, JobQueueError>;

    /// Mark the claimed attempt as completed.
    ///
    /// Fails with [`JobQueueError::NotProcessing`] when the attempt no longer holds the job.
    async fn complete(&self, job: JobUuid, attempt: u32) -> Result<JobRecord, JobQueueError>;

    /// Release the claimed attempt for another try at `available_at`.
    async fn retry(
        &self,
        job: JobUuid,
        attempt: u32,
        available_at: Timestamp,
        error: String,
    ) -> Result<JobRecord, JobQueueError>;

    /// Fail the claimed attempt terminally.
    async fn fail(
        &self,
        job: JobUuid,
        attempt: u32,
        error: String,
    ) -> Result<JobRecord, JobQueueError>;

    async fn get_job(&self, job: JobUuid) -> Result<JobRecord, JobQueueError>;

    /// Most recent jobs of a tenant, newest first.
    async fn list_jobs(
        &self,
        tenant: TenantUuid,
        status: Option<JobStatus>,
        limit: u32,
    ) -> Result<Vec<JobRecord>, JobQueueError>;
}

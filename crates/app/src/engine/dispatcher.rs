//! Job dispatcher

use std::{collections::HashMap, sync::Arc};

use jiff::Timestamp;
use tracing::{debug, info, warn};

use crate::{
    domain::jobs::{
        JobQueue, RetryPolicy,
        data::EnqueueOutcome,
        records::{JobRecord, Queue},
    },
    engine::{SyncError, WorkItem},
};

/// What [`Dispatcher::settle`] did with a finished attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum Settlement {
    Completed(JobRecord),

    /// Released for another attempt at the job's `available_at`.
    Retrying(JobRecord),

    /// Terminal failure; needs an operator.
    Failed(JobRecord),
}

impl Settlement {
    #[must_use]
    pub fn job(&self) -> &JobRecord {
        match self {
            Self::Completed(job) | Self::Retrying(job) | Self::Failed(job) => job,
        }
    }

    /// Label for logs and metrics.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Completed(_) => "completed",
            Self::Retrying(_) => "retrying",
            Self::Failed(_) => "failed",
        }
    }
}

/// Enqueues work items and applies the retry policy to finished attempts.
#[derive(Clone)]
pub struct Dispatcher {
    jobs: Arc<dyn JobQueue>,
    default_policy: RetryPolicy,
    policies: HashMap<Queue, RetryPolicy>,
}

impl Dispatcher {
    #[must_use]
    pub fn new(jobs: Arc<dyn JobQueue>, default_policy: RetryPolicy) -> Self {
        Self {
            jobs,
            default_policy,
            policies: HashMap::new(),
        }
    }

    /// Override the retry policy for one queue.
    #[must_use]
    pub fn with_policy(mut self, queue: Queue, policy: RetryPolicy) -> Self {
        self.policies.insert(queue, policy);
        self
    }

    #[must_use]
    pub fn policy_for(&self, queue: Queue) -> RetryPolicy {
        self.policies
            .get(&queue)
            .copied()
            .unwrap_or(self.default_policy)
    }

    /// Enqueue `item` under its queue's retry policy.
    ///
    /// Items carrying a source event id are deduplicated per tenant and entity type; a
    /// duplicate returns the job that already exists.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::InvalidPayload`] for an invalid item and
    /// [`SyncError::Storage`] when the queue write fails.
    pub async fn enqueue(&self, item: WorkItem) -> Result<EnqueueOutcome, SyncError> {
        let policy = self.policy_for(item.payload.queue());

        self.enqueue_with(item, policy).await
    }

    /// Enqueue `item` with an explicit retry policy.
    ///
    /// # Errors
    ///
    /// See [`Dispatcher::enqueue`].
    pub async fn enqueue_with(
        &self,
        item: WorkItem,
        policy: RetryPolicy,
    ) -> Result<EnqueueOutcome, SyncError> {
        let tenant = item.tenant;
        let job = item.into_new_job(policy)?;
        let queue = job.queue;

        let outcome = self.jobs.enqueue(tenant, job).await?;

        match &outcome {
            EnqueueOutcome::Enqueued(job) => {
                debug!(%tenant, %queue, job = %job.uuid, "job enqueued");
            }
            EnqueueOutcome::Duplicate(job) => {
                info!(%tenant, %queue, job = %job.uuid, status = %job.status, "duplicate work item ignored");
            }
        }

        Ok(outcome)
    }

    /// Settle the claimed attempt of `job` from its result.
    ///
    /// Success completes the job. A retryable failure below the job's attempt limit
    /// releases it with exponential backoff; anything else fails it terminally.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Storage`] when the queue write fails, including when the
    /// attempt lost its lease to another worker.
    pub async fn settle<T>(
        &self,
        job: &JobRecord,
        result: &Result<T, SyncError>,
    ) -> Result<Settlement, SyncError> {
        let attempt = job.attempts;

        let error = match result {
            Ok(_) => {
                let record = self.jobs.complete(job.uuid, attempt).await?;

                return Ok(Settlement::Completed(record));
            }
            Err(error) => error,
        };

        let message = error.report();

        if error.is_retryable() && job.retry_policy.allows_retry_after(attempt) {
            let delay = job.retry_policy.delay_for(attempt);
            let now = Timestamp::now();
            let available_at = now.checked_add(delay).unwrap_or(now);

            let record = self
                .jobs
                .retry(job.uuid, attempt, available_at, message)
                .await?;

            info!(
                tenant = %job.tenant_uuid,
                job = %job.uuid,
                attempt,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                class = error.class(),
                "job scheduled for retry"
            );

            return Ok(Settlement::Retrying(record));
        }

        let record = self.jobs.fail(job.uuid, attempt, message).await?;

        warn!(
            tenant = %job.tenant_uuid,
            job = %job.uuid,
            attempt,
            class = error.class(),
            retryable = error.is_retryable(),
            "job failed terminally"
        );

        Ok(Settlement::Failed(record))
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("default_policy", &self.default_policy)
            .field("policies", &self.policies)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use mockall::predicate::eq;
    use serde_json::json;
    use testresult::TestResult;

    use super::*;
    use crate::{
        domain::{
            entities::EntityType,
            jobs::{
                MockJobQueue,
                records::{JobStatus, JobUuid, Operation},
            },
            tenants::records::TenantUuid,
        },
        engine::JobPayload,
        platforms::PlatformError,
    };

    fn claimed(attempts: u32) -> JobRecord {
        JobRecord {
            uuid: JobUuid::new(),
            tenant_uuid: TenantUuid::new(),
            queue: Queue::Orders,
            entity_type: EntityType::Order,
            operation: Operation::Create,
            source_event_id: None,
            payload: json!({ "kind": "order", "order_id": "O1" }),
            status: JobStatus::Processing,
            attempts,
            retry_policy: RetryPolicy::default(),
            available_at: Timestamp::UNIX_EPOCH,
            lease_expires_at: None,
            last_error: None,
            created_at: Timestamp::UNIX_EPOCH,
            updated_at: Timestamp::UNIX_EPOCH,
        }
    }

    fn with_status(job: &JobRecord, status: JobStatus) -> JobRecord {
        JobRecord {
            status,
            ..job.clone()
        }
    }

    fn platform_failure() -> Result<(), SyncError> {
        Err(PlatformError::MissingData { platform: "erp" }.into())
    }

    #[tokio::test]
    async fn success_completes_the_attempt() -> TestResult {
        let job = claimed(1);
        let completed = with_status(&job, JobStatus::Completed);

        let mut queue = MockJobQueue::new();
        queue
            .expect_complete()
            .with(eq(job.uuid), eq(1))
            .times(1)
            .return_once(move |_, _| Ok(completed));

        let dispatcher = Dispatcher::new(Arc::new(queue), RetryPolicy::default());
        let settlement = dispatcher.settle(&job, &Ok::<(), SyncError>(())).await?;

        assert_eq!(settlement.label(), "completed");

        Ok(())
    }

    #[tokio::test]
    async fn retryable_failure_below_limit_is_retried_with_backoff() -> TestResult {
        let job = claimed(2);
        let retrying = with_status(&job, JobStatus::Retrying);
        let before = Timestamp::now();

        let mut queue = MockJobQueue::new();
        queue
            .expect_retry()
            .withf(move |_, attempt, available_at, _| {
                let expected = before.checked_add(Duration::from_secs(4)).ok();
                *attempt == 2 && expected.is_some_and(|expected| *available_at >= expected)
            })
            .times(1)
            .return_once(move |_, _, _, _| Ok(retrying));

        let dispatcher = Dispatcher::new(Arc::new(queue), RetryPolicy::default());
        let settlement = dispatcher.settle(&job, &platform_failure()).await?;

        assert_eq!(settlement.label(), "retrying");

        Ok(())
    }

    #[tokio::test]
    async fn retryable_failure_at_limit_fails_terminally() -> TestResult {
        let job = claimed(3);
        let failed = with_status(&job, JobStatus::Failed);

        let mut queue = MockJobQueue::new();
        queue.expect_retry().never();
        queue
            .expect_fail()
            .withf(|_, attempt, error| *attempt == 3 && error.contains("no data"))
            .times(1)
            .return_once(move |_, _, _| Ok(failed));

        let dispatcher = Dispatcher::new(Arc::new(queue), RetryPolicy::default());
        let settlement = dispatcher.settle(&job, &platform_failure()).await?;

        assert_eq!(settlement.label(), "failed");

        Ok(())
    }

    #[tokio::test]
    async fn configuration_failure_is_never_retried() -> TestResult {
        let job = claimed(1);
        let failed = with_status(&job, JobStatus::Failed);

        let mut queue = MockJobQueue::new();
        queue.expect_retry().never();
        queue
            .expect_fail()
            .times(1)
            .return_once(move |_, _, _| Ok(failed));

        let dispatcher = Dispatcher::new(Arc::new(queue), RetryPolicy::default());
        let result: Result<(), SyncError> =
            Err(SyncError::Configuration("credentials missing".to_string()));

        assert_eq!(dispatcher.settle(&job, &result).await?.label(), "failed");

        Ok(())
    }

    #[tokio::test]
    async fn enqueue_uses_queue_policy() -> TestResult {
        let tenant = TenantUuid::new();
        let sync_policy = RetryPolicy::new(5, Duration::from_secs(10), Duration::from_secs(300));

        let mut queue = MockJobQueue::new();
        queue
            .expect_enqueue()
            .withf(move |_, job| job.queue == Queue::Sync && job.retry_policy == sync_policy)
            .times(1)
            .returning(|tenant, job| {
                let mut record = claimed(0);
                record.tenant_uuid = tenant;
                record.uuid = job.uuid;
                record.status = JobStatus::Pending;
                Ok(EnqueueOutcome::Enqueued(record))
            });

        let dispatcher = Dispatcher::new(Arc::new(queue), RetryPolicy::default())
            .with_policy(Queue::Sync, sync_policy);

        let outcome = dispatcher
            .enqueue(WorkItem::cursor_sync(tenant, EntityType::Product, 1))
            .await?;

        assert!(!outcome.is_duplicate());

        Ok(())
    }

    #[tokio::test]
    async fn invalid_items_never_reach_the_queue() {
        let mut queue = MockJobQueue::new();
        queue.expect_enqueue().never();

        let dispatcher = Dispatcher::new(Arc::new(queue), RetryPolicy::default());
        let item = WorkItem {
            tenant: TenantUuid::new(),
            operation: Operation::Sync,
            source_event_id: None,
            payload: JobPayload::Order {
                order_id: "O1".to_string(),
            },
        };

        assert!(matches!(
            dispatcher.enqueue(item).await,
            Err(SyncError::InvalidPayload(_))
        ));
    }
}

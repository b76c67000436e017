//! Worker pools

use std::{sync::Arc, time::Duration};

use jiff::Timestamp;
use tokio::{
    sync::{Semaphore, watch},
    task::JoinSet,
    time::{Instant, sleep, timeout},
};
use tracing::{Instrument, debug, error, info, info_span, warn};

use crate::{
    domain::{
        audits::{JobAuditsService, data::NewJobAudit},
        jobs::{
            JobQueue, JobQueueError,
            records::{JobRecord, Queue},
        },
        tenants::TenantsService,
    },
    engine::{
        Dispatcher, JobPayload, ProcessOutcome, Settlement, SyncError,
        processors::{ClaimedJob, Processor},
    },
};

/// Name recorded on audit rows for jobs of `queue`.
#[must_use]
pub const fn job_type(queue: Queue) -> &'static str {
    match queue {
        Queue::Orders => "order-sync",
        Queue::Products => "product-sync",
        Queue::Sync => "cursor-sync",
    }
}

/// Hooks for job metrics. The default methods do nothing.
pub trait JobEvents: Send + Sync {
    fn job_started(&self, _queue: Queue) {}

    fn job_finished(&self, _queue: Queue, _outcome: &str, _duration: Duration) {}
}

/// [`JobEvents`] that records nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopJobEvents;

impl JobEvents for NoopJobEvents {}

/// Per-pool settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerSettings {
    /// Jobs processed at once.
    pub concurrency: usize,

    /// Visibility lease taken on claim.
    pub lease: Duration,

    /// Wait between polls when the queue is empty.
    pub poll_interval: Duration,

    /// Upper bound for one attempt.
    pub processing_timeout: Duration,
}

impl WorkerSettings {
    /// Defaults for `queue`: orders 5, products 3, cursor sync 2.
    #[must_use]
    pub const fn for_queue(queue: Queue) -> Self {
        let concurrency = match queue {
            Queue::Orders => 5,
            Queue::Products => 3,
            Queue::Sync => 2,
        };

        Self {
            concurrency,
            lease: Duration::from_secs(300),
            poll_interval: Duration::from_secs(1),
            processing_timeout: Duration::from_secs(120),
        }
    }

    /// Whether every attempt times out before its lease lapses, so no second worker can
    /// claim a job that is still being processed.
    #[must_use]
    pub fn lease_outlives_timeout(&self) -> bool {
        self.processing_timeout < self.lease
    }
}

/// Runs claimed jobs: audit, process, settle.
#[derive(Clone)]
pub struct JobRunner {
    jobs: Arc<dyn JobQueue>,
    audits: Arc<dyn JobAuditsService>,
    tenants: Arc<dyn TenantsService>,
    dispatcher: Dispatcher,
    events: Arc<dyn JobEvents>,
}

impl JobRunner {
    #[must_use]
    pub fn new(
        jobs: Arc<dyn JobQueue>,
        audits: Arc<dyn JobAuditsService>,
        tenants: Arc<dyn TenantsService>,
        dispatcher: Dispatcher,
    ) -> Self {
        Self {
            jobs,
            audits,
            tenants,
            dispatcher,
            events: Arc::new(NoopJobEvents),
        }
    }

    #[must_use]
    pub fn with_events(mut self, events: Arc<dyn JobEvents>) -> Self {
        self.events = events;
        self
    }

    #[must_use]
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Claim one job from `queue`, if any is available.
    ///
    /// # Errors
    ///
    /// Returns an error when the queue cannot be read.
    pub async fn claim(
        &self,
        queue: Queue,
        lease: Duration,
    ) -> Result<Option<JobRecord>, JobQueueError> {
        self.jobs.claim(queue, lease).await
    }

    /// Run one claimed attempt to completion and settle it.
    ///
    /// Failures are recorded on the audit row and the job; the returned settlement is
    /// `None` only when the attempt could not be settled at all.
    pub async fn run(
        &self,
        job: JobRecord,
        processor: &dyn Processor,
        processing_timeout: Duration,
    ) -> Option<Settlement> {
        let started = Instant::now();
        self.events.job_started(job.queue);

        let started_audit = self
            .audits
            .start_attempt(
                job.tenant_uuid,
                NewJobAudit {
                    job_uuid: job.uuid,
                    attempt: job.attempts,
                    job_type: job_type(job.queue).to_string(),
                    payload: job.payload.clone(),
                    started_at: Timestamp::now(),
                },
            )
            .await;

        let (audit, result) = match started_audit {
            Ok(audit) => {
                let result = self.attempt(&job, processor, processing_timeout).await;
                (Some(audit), result)
            }
            Err(error) => {
                error!(error = %error, "could not record attempt start");
                (None, Err(SyncError::from(error)))
            }
        };

        if let Some(audit) = &audit {
            let recorded = match &result {
                Ok(outcome) => {
                    self.audits
                        .complete_attempt(job.tenant_uuid, audit.uuid, outcome.result.clone())
                        .await
                }
                Err(error) => {
                    self.audits
                        .fail_attempt(job.tenant_uuid, audit.uuid, error.report())
                        .await
                }
            };

            if let Err(error) = recorded {
                error!(error = %error, audit = %audit.uuid, "could not record attempt outcome");
            }
        }

        if let Ok(outcome) = &result {
            self.enqueue_follow_up(outcome).await;
        }

        let settlement = match self.dispatcher.settle(&job, &result).await {
            Ok(settlement) => Some(settlement),
            Err(error) if error.is_lease_lost() => {
                warn!("lease lost before settling; another worker owns the job");
                None
            }
            Err(error) => {
                error!(error = %error.report(), "could not settle job");
                None
            }
        };

        let outcome = settlement.as_ref().map_or("unsettled", Settlement::label);
        self.events
            .job_finished(job.queue, outcome, started.elapsed());

        settlement
    }

    async fn attempt(
        &self,
        job: &JobRecord,
        processor: &dyn Processor,
        processing_timeout: Duration,
    ) -> Result<ProcessOutcome, SyncError> {
        let tenant = self.tenants.get_tenant(job.tenant_uuid).await?;

        if !tenant.active {
            return Err(SyncError::Configuration(format!(
                "tenant {} is inactive",
                tenant.uuid
            )));
        }

        let claimed = ClaimedJob {
            uuid: job.uuid,
            tenant: job.tenant_uuid,
            operation: job.operation,
            attempt: job.attempts,
            payload: JobPayload::from_job(job)?,
        };

        timeout(processing_timeout, processor.process(&claimed))
            .await
            .map_err(|_elapsed| SyncError::TimedOut(processing_timeout))?
    }

    async fn enqueue_follow_up(&self, outcome: &ProcessOutcome) {
        for item in outcome.follow_up.iter().cloned() {
            if let Err(error) = self.dispatcher.enqueue(item).await {
                // The next scheduled sync resumes from the stored cursor.
                warn!(error = %error.report(), "could not enqueue follow-up work");
            }
        }
    }
}

impl std::fmt::Debug for JobRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobRunner")
            .field("dispatcher", &self.dispatcher)
            .finish_non_exhaustive()
    }
}

/// Bounded pool of workers draining one queue.
pub struct WorkerPool {
    queue: Queue,
    settings: WorkerSettings,
    runner: JobRunner,
    processor: Arc<dyn Processor>,
}

impl WorkerPool {
    #[must_use]
    pub fn new(
        queue: Queue,
        settings: WorkerSettings,
        runner: JobRunner,
        processor: Arc<dyn Processor>,
    ) -> Self {
        Self {
            queue,
            settings,
            runner,
            processor,
        }
    }

    /// Claim and process jobs until `shutdown` flips to `true`, then wait for in-flight
    /// attempts to finish.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let queue = self.queue;
        let settings = self.settings;
        let semaphore = Arc::new(Semaphore::new(settings.concurrency.max(1)));
        let mut tasks = JoinSet::new();

        info!(%queue, concurrency = settings.concurrency, "starting worker pool");

        loop {
            if *shutdown.borrow() {
                break;
            }

            while let Some(joined) = tasks.try_join_next() {
                if let Err(error) = joined {
                    error!(%queue, error = %error, "worker task panicked");
                }
            }

            let permit = tokio::select! {
                permit = Arc::clone(&semaphore).acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_closed) => break,
                },
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    continue;
                }
            };

            match self.runner.claim(queue, settings.lease).await {
                Ok(Some(job)) => {
                    let runner = self.runner.clone();
                    let processor = Arc::clone(&self.processor);
                    let span = info_span!(
                        "job",
                        %queue,
                        job = %job.uuid,
                        tenant = %job.tenant_uuid,
                        attempt = job.attempts
                    );

                    tasks.spawn(
                        async move {
                            let _permit = permit;
                            runner
                                .run(job, processor.as_ref(), settings.processing_timeout)
                                .await;
                        }
                        .instrument(span),
                    );
                }
                Ok(None) => {
                    drop(permit);
                    idle(&mut shutdown, settings.poll_interval).await;
                }
                Err(error) => {
                    drop(permit);
                    error!(%queue, error = %error, "failed to claim job");
                    idle(&mut shutdown, settings.poll_interval).await;
                }
            }
        }

        debug!(%queue, in_flight = tasks.len(), "draining worker pool");

        while let Some(joined) = tasks.join_next().await {
            if let Err(error) = joined {
                error!(%queue, error = %error, "worker task panicked");
            }
        }

        info!(%queue, "worker pool stopped");
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("queue", &self.queue)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

async fn idle(shutdown: &mut watch::Receiver<bool>, poll_interval: Duration) {
    tokio::select! {
        () = sleep(poll_interval) => {}
        _changed = shutdown.changed() => {}
    }
}

//! Worker Config

use std::time::Duration;

use clap::{ArgAction, Args, error::ErrorKind};

use syncbridge_app::{
    domain::jobs::{RetryPolicy, records::Queue},
    engine::WorkerSettings,
};

/// Worker pool, retry and scheduling settings.
#[derive(Debug, Args)]
pub struct WorkersConfig {
    /// Run worker pools and the scheduler in this process
    #[arg(long, env = "WORKERS_ENABLED", default_value_t = true, action = ArgAction::Set)]
    pub workers_enabled: bool,

    /// Order jobs processed at once
    #[arg(long, env = "ORDERS_CONCURRENCY", default_value_t = 5_usize)]
    pub orders_concurrency: usize,

    /// Product jobs processed at once
    #[arg(long, env = "PRODUCTS_CONCURRENCY", default_value_t = 3_usize)]
    pub products_concurrency: usize,

    /// Cursor-sync jobs processed at once
    #[arg(long, env = "SYNC_CONCURRENCY", default_value_t = 2_usize)]
    pub sync_concurrency: usize,

    /// Visibility lease taken when a job is claimed, in seconds
    #[arg(long, env = "JOB_LEASE_SECONDS", default_value_t = 300_u64)]
    pub job_lease_seconds: u64,

    /// Idle wait between queue polls, in milliseconds
    #[arg(long, env = "JOB_POLL_INTERVAL_MS", default_value_t = 1_000_u64)]
    pub job_poll_interval_ms: u64,

    /// Upper bound for one processing attempt, in seconds
    #[arg(long, env = "JOB_PROCESSING_TIMEOUT_SECONDS", default_value_t = 120_u64)]
    pub job_processing_timeout_seconds: u64,

    /// Total attempts per job, including the first
    #[arg(long, env = "RETRY_MAX_ATTEMPTS", default_value_t = 3_u32)]
    pub retry_max_attempts: u32,

    /// Delay before the second attempt, in milliseconds
    #[arg(long, env = "RETRY_BASE_DELAY_MS", default_value_t = 2_000_u64)]
    pub retry_base_delay_ms: u64,

    /// Cap for any single retry delay, in seconds
    #[arg(long, env = "RETRY_MAX_DELAY_SECONDS", default_value_t = 60_u64)]
    pub retry_max_delay_seconds: u64,

    /// Interval between scheduled cursor syncs, in seconds (0 disables the scheduler)
    #[arg(long, env = "SYNC_INTERVAL_SECONDS", default_value_t = 300_u64)]
    pub sync_interval_seconds: u64,

    /// Unprocessed webhooks replayed per tenant on each scheduler tick
    #[arg(long, env = "WEBHOOK_REPLAY_LIMIT", default_value_t = 100_u32)]
    pub webhook_replay_limit: u32,
}

impl WorkersConfig {
    /// Reject combinations that would let two workers process one job.
    ///
    /// # Errors
    ///
    /// Returns an error when the processing timeout is not shorter than the lease.
    pub fn validate(&self) -> Result<(), clap::Error> {
        let lease_outlives_timeout = Queue::ALL
            .into_iter()
            .all(|queue| self.settings_for(queue).lease_outlives_timeout());

        if lease_outlives_timeout {
            Ok(())
        } else {
            Err(clap::Error::raw(
                ErrorKind::ArgumentConflict,
                format!(
                    "JOB_PROCESSING_TIMEOUT_SECONDS ({}) must be shorter than JOB_LEASE_SECONDS ({})\n",
                    self.job_processing_timeout_seconds, self.job_lease_seconds
                ),
            ))
        }
    }

    /// Pool settings for `queue`.
    #[must_use]
    pub fn settings_for(&self, queue: Queue) -> WorkerSettings {
        let concurrency = match queue {
            Queue::Orders => self.orders_concurrency,
            Queue::Products => self.products_concurrency,
            Queue::Sync => self.sync_concurrency,
        };

        WorkerSettings {
            concurrency,
            lease: Duration::from_secs(self.job_lease_seconds),
            poll_interval: Duration::from_millis(self.job_poll_interval_ms),
            processing_timeout: Duration::from_secs(self.job_processing_timeout_seconds),
        }
    }

    /// Retry policy stamped on newly enqueued jobs.
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.retry_max_attempts,
            Duration::from_millis(self.retry_base_delay_ms),
            Duration::from_secs(self.retry_max_delay_seconds),
        )
    }

    /// Scheduler interval, or `None` when scheduling is disabled.
    #[must_use]
    pub fn sync_interval(&self) -> Option<Duration> {
        (self.sync_interval_seconds > 0).then(|| Duration::from_secs(self.sync_interval_seconds))
    }
}

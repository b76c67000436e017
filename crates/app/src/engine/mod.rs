//! Reconciliation engine
//!
//! Work enters through [`WebhookIngress`] or the [`Scheduler`], is queued by the
//! [`Dispatcher`], and is drained by one [`WorkerPool`] per queue. Pools run each claimed
//! job through its [`Processor`], record the attempt in the audit ledger and let the
//! dispatcher settle it against the job's retry policy.

mod dispatcher;
mod errors;
mod ingress;
pub mod processors;
mod scheduler;
mod work;
mod worker;

pub use dispatcher::{Dispatcher, Settlement};
pub use errors::SyncError;
pub use ingress::{IngressError, IngressReceipt, QueuedJob, UNKNOWN_EVENT, WebhookIngress, derive_work};
pub use processors::{
    ClaimedJob, ClientResolver, CursorSyncProcessor, DEFAULT_PAGE_SIZE, OrderProcessor, Processor,
    ProductProcessor,
};
pub use scheduler::{Scheduler, TickSummary};
pub use work::{CURSOR_SYNC_ENTITIES, JobPayload, ProcessOutcome, WorkItem};
pub use worker::{JobEvents, JobRunner, NoopJobEvents, WorkerPool, WorkerSettings, job_type};

//! Job Data

use serde_json::Value;

use crate::domain::{
    entities::EntityType,
    jobs::{
        RetryPolicy,
        records::{JobRecord, JobUuid, Operation, Queue},
    },
};

/// Job to enqueue.
#[derive(Debug, Clone, PartialEq)]
pub struct NewJob {
    pub uuid: JobUuid,
    pub queue: Queue,
    pub entity_type: EntityType,
    pub operation: Operation,
    pub source_event_id: Option<String>,
    pub payload: Value,
    pub retry_policy: RetryPolicy,
}

/// Result of an enqueue call.
#[derive(Debug, Clone, PartialEq)]
pub enum EnqueueOutcome {
    /// A new job was written.
    Enqueued(JobRecord),

    /// A job with the same source event id already exists for this tenant and entity type.
    Duplicate(JobRecord),
}

impl EnqueueOutcome {
    #[must_use]
    pub fn job(&self) -> &JobRecord {
        match self {
            Self::Enqueued(job) | Self::Duplicate(job) => job,
        }
    }

    #[must_use]
    pub const fn is_duplicate(&self) -> bool {
        matches!(self, Self::Duplicate(_))
    }
}

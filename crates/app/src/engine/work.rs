//! Work items and job payloads

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    domain::{
        entities::EntityType,
        jobs::{
            RetryPolicy,
            data::NewJob,
            records::{JobRecord, JobUuid, Operation, Queue},
        },
        tenants::records::TenantUuid,
    },
    engine::SyncError,
};

/// Entity types the cursor-sync processor knows how to pull from the ERP.
pub const CURSOR_SYNC_ENTITIES: [EntityType; 2] = [EntityType::Product, EntityType::Customer];

/// Payload stored on a queued job, tagged by kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JobPayload {
    /// An e-commerce order to replicate into the ERP.
    Order { order_id: String },

    /// An ERP product, identified by its code, to push to the e-commerce platform.
    Product { code: String },

    /// One page of an incremental pull from the ERP.
    CursorSync { entity_type: EntityType, page: u32 },
}

impl JobPayload {
    #[must_use]
    pub const fn queue(&self) -> Queue {
        match self {
            Self::Order { .. } => Queue::Orders,
            Self::Product { .. } => Queue::Products,
            Self::CursorSync { .. } => Queue::Sync,
        }
    }

    #[must_use]
    pub const fn entity_type(&self) -> EntityType {
        match self {
            Self::Order { .. } => EntityType::Order,
            Self::Product { .. } => EntityType::Product,
            Self::CursorSync { entity_type, .. } => *entity_type,
        }
    }

    /// Check that `operation` makes sense for this payload.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::InvalidPayload`] for blank ids, a cursor sync on an entity
    /// type that cannot be pulled, or an operation the processor does not handle.
    pub fn validate(&self, operation: Operation) -> Result<(), SyncError> {
        match (self, operation) {
            (Self::Order { order_id }, Operation::Create | Operation::Update) => {
                non_blank("order_id", order_id)
            }
            (Self::Product { code }, Operation::Create | Operation::Update | Operation::Delete) => {
                non_blank("code", code)
            }
            (Self::CursorSync { entity_type, page }, Operation::Sync) => {
                if !CURSOR_SYNC_ENTITIES.contains(entity_type) {
                    return Err(SyncError::InvalidPayload(format!(
                        "cursor sync is not supported for {entity_type}"
                    )));
                }

                if *page == 0 {
                    return Err(SyncError::InvalidPayload("pages start at 1".to_string()));
                }

                Ok(())
            }
            (payload, operation) => Err(SyncError::InvalidPayload(format!(
                "operation {operation} is not valid for a {} job",
                payload.queue()
            ))),
        }
    }

    /// Decode and validate the payload of a claimed job.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::InvalidPayload`] when the payload does not decode, belongs to
    /// another queue, or fails [`JobPayload::validate`].
    pub fn from_job(job: &JobRecord) -> Result<Self, SyncError> {
        let payload: Self = serde_json::from_value(job.payload.clone())
            .map_err(|error| SyncError::InvalidPayload(error.to_string()))?;

        if payload.queue() != job.queue || payload.entity_type() != job.entity_type {
            return Err(SyncError::InvalidPayload(format!(
                "{} payload on the {} queue",
                payload.entity_type(),
                job.queue
            )));
        }

        payload.validate(job.operation)?;

        Ok(payload)
    }
}

fn non_blank(field: &str, value: &str) -> Result<(), SyncError> {
    if value.trim().is_empty() {
        return Err(SyncError::InvalidPayload(format!("`{field}` is blank")));
    }

    Ok(())
}

/// Request to perform one unit of reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    pub tenant: TenantUuid,
    pub operation: Operation,
    /// Deduplication key; `None` for scheduled work.
    pub source_event_id: Option<String>,
    pub payload: JobPayload,
}

impl WorkItem {
    #[must_use]
    pub fn cursor_sync(tenant: TenantUuid, entity_type: EntityType, page: u32) -> Self {
        Self {
            tenant,
            operation: Operation::Sync,
            source_event_id: None,
            payload: JobPayload::CursorSync { entity_type, page },
        }
    }

    /// Build the queue row for this item.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::InvalidPayload`] when the payload fails validation.
    pub fn into_new_job(self, retry_policy: RetryPolicy) -> Result<NewJob, SyncError> {
        self.payload.validate(self.operation)?;

        let payload = serde_json::to_value(&self.payload)
            .map_err(|error| SyncError::InvalidPayload(error.to_string()))?;

        Ok(NewJob {
            uuid: JobUuid::new(),
            queue: self.payload.queue(),
            entity_type: self.payload.entity_type(),
            operation: self.operation,
            source_event_id: self.source_event_id,
            payload,
            retry_policy,
        })
    }
}

/// Result of a successful attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessOutcome {
    /// Stored on the audit row.
    pub result: Value,

    /// Work to enqueue once this attempt is settled, e.g. the next cursor-sync page.
    pub follow_up: Vec<WorkItem>,
}

impl ProcessOutcome {
    #[must_use]
    pub fn new(result: Value) -> Self {
        Self {
            result,
            follow_up: Vec::new(),
        }
    }
}

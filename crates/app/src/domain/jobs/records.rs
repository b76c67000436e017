//! Job Records

use std::{fmt, str::FromStr};

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::{
    domain::{entities::EntityType, jobs::RetryPolicy, tenants::records::TenantUuid},
    uuids::TypedUuid,
};

/// Job UUID
pub type JobUuid = TypedUuid<JobRecord>;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown {kind} `{value}`")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

macro_rules! text_enum {
    ($name:ident, $kind:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                $(
                    if value.eq_ignore_ascii_case($text) {
                        return Ok(Self::$variant);
                    }
                )+

                Err(UnknownVariant {
                    kind: $kind,
                    value: value.to_string(),
                })
            }
        }
    };
}

/// Worker pool a job is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Queue {
    Orders,
    Products,
    Sync,
}

text_enum!(Queue, "queue", {
    Orders => "orders",
    Products => "products",
    Sync => "sync",
});

impl Queue {
    pub const ALL: [Self; 3] = [Self::Orders, Self::Products, Self::Sync];
}

/// What a work item asks the processor to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Create,
    Update,
    Delete,
    Sync,
}

text_enum!(Operation, "operation", {
    Create => "create",
    Update => "update",
    Delete => "delete",
    Sync => "sync",
});

/// Lifecycle of a job and of each audited attempt.
///
/// Audit rows only ever hold `Processing`, `Completed` or `Failed`; `Pending` and
/// `Retrying` describe a job waiting in the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Retrying,
}

text_enum!(JobStatus, "job status", {
    Pending => "PENDING",
    Processing => "PROCESSING",
    Completed => "COMPLETED",
    Failed => "FAILED",
    Retrying => "RETRYING",
});

impl JobStatus {
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// Job Record
#[derive(Debug, Clone, PartialEq)]
pub struct JobRecord {
    pub uuid: JobUuid,
    pub tenant_uuid: TenantUuid,
    pub queue: Queue,
    pub entity_type: EntityType,
    pub operation: Operation,

    /// Deduplication key derived from the triggering event, if any.
    pub source_event_id: Option<String>,
    pub payload: Value,
    pub status: JobStatus,

    /// Attempts claimed so far, including the one in progress.
    pub attempts: u32,
    pub retry_policy: RetryPolicy,
    pub available_at: Timestamp,
    pub lease_expires_at: Option<Timestamp>,
    pub last_error: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

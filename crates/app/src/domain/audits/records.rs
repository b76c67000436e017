//! Job Audit Records

use jiff::Timestamp;
use serde_json::Value;

use crate::{
    domain::{
        jobs::records::{JobStatus, JobUuid},
        tenants::records::TenantUuid,
    },
    uuids::TypedUuid,
};

/// Job Audit UUID
pub type JobAuditUuid = TypedUuid<JobAuditRecord>;

/// Job Audit Record
#[derive(Debug, Clone, PartialEq)]
pub struct JobAuditRecord {
    pub uuid: JobAuditUuid,
    pub tenant_uuid: TenantUuid,
    pub job_uuid: JobUuid,

    /// 1-based attempt number this row describes.
    pub attempt: u32,

    /// Processor that handled the attempt, e.g. `order-sync`.
    pub job_type: String,
    pub status: JobStatus,
    pub payload: Value,
    pub result: Option<Value>,
    pub error: Option<String>,
    pub started_at: Timestamp,
    pub completed_at: Option<Timestamp>,
    pub duration_ms: Option<u64>,
}

//! Job Audit Data

use jiff::Timestamp;
use serde_json::Value;

use crate::domain::jobs::records::{JobStatus, JobUuid};

/// Attempt being started.
#[derive(Debug, Clone, PartialEq)]
pub struct NewJobAudit {
    pub job_uuid: JobUuid,
    pub attempt: u32,
    pub job_type: String,
    pub payload: Value,
    pub started_at: Timestamp,
}

/// Filters for [`super::JobAuditsService::query`]; unset fields match everything.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditQuery {
    pub job: Option<JobUuid>,
    pub status: Option<JobStatus>,
    pub started_from: Option<Timestamp>,
    pub started_before: Option<Timestamp>,
    pub limit: u32,
}

impl Default for AuditQuery {
    fn default() -> Self {
        Self {
            job: None,
            status: None,
            started_from: None,
            started_before: None,
            limit: 100,
        }
    }
}

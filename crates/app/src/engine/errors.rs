//! Engine error taxonomy

use std::time::Duration;

use thiserror::Error;

use crate::{
    domain::{
        audits::JobAuditsServiceError, credentials::CredentialsServiceError,
        cursors::SyncCursorsServiceError, jobs::JobQueueError, mappings::MappingsServiceError,
        tenants::TenantsServiceError, webhooks::WebhookEventsServiceError,
    },
    platforms::PlatformError,
    translation::TranslationError,
};

/// Boxed store error kept as the source of [`SyncError::Storage`].
pub type StorageSource = Box<dyn std::error::Error + Send + Sync>;

/// Failure of one unit of reconciliation work.
///
/// The class decides what the dispatcher does next; see [`SyncError::is_retryable`].
#[derive(Debug, Error)]
pub enum SyncError {
    /// Missing or inactive tenant or credentials. Needs an operator.
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("translation failed")]
    Translation(#[from] TranslationError),

    #[error("platform call failed")]
    PlatformCall(#[from] PlatformError),

    /// The attempt ran past its processing timeout; classed with platform failures.
    #[error("processing timed out after {0:?}")]
    TimedOut(Duration),

    /// A mapping write would break the one-to-one correspondence.
    #[error("mapping conflict: {0}")]
    Conflict(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("storage error")]
    Storage(#[source] StorageSource),

    /// The job payload does not match its queue or operation.
    #[error("invalid job payload: {0}")]
    InvalidPayload(String),
}

impl SyncError {
    /// Whether the dispatcher may schedule another attempt.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Translation(_) | Self::PlatformCall(_) | Self::TimedOut(_) | Self::Storage(_) => {
                true
            }
            Self::Configuration(_)
            | Self::Conflict(_)
            | Self::NotFound(_)
            | Self::InvalidPayload(_) => false,
        }
    }

    /// Stable label for logs and metrics.
    #[must_use]
    pub const fn class(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "configuration",
            Self::Translation(_) => "translation",
            Self::PlatformCall(_) | Self::TimedOut(_) => "platform_call",
            Self::Conflict(_) => "conflict",
            Self::NotFound(_) => "not_found",
            Self::Storage(_) => "storage",
            Self::InvalidPayload(_) => "invalid_payload",
        }
    }

    /// Whether a queue write failed because another worker took over the job.
    #[must_use]
    pub fn is_lease_lost(&self) -> bool {
        match self {
            Self::Storage(source) => source
                .downcast_ref::<JobQueueError>()
                .is_some_and(|error| matches!(error, JobQueueError::NotProcessing)),
            _ => false,
        }
    }

    /// Message recorded on the audit row and the job, including the source chain.
    #[must_use]
    pub fn report(&self) -> String {
        let mut report = self.to_string();
        let mut source = std::error::Error::source(self);

        while let Some(error) = source {
            report.push_str(": ");
            report.push_str(&error.to_string());
            source = error.source();
        }

        report
    }
}

impl From<MappingsServiceError> for SyncError {
    fn from(error: MappingsServiceError) -> Self {
        match error {
            MappingsServiceError::Conflict => Self::Conflict(error.to_string()),
            MappingsServiceError::NotFound => Self::NotFound("mapping".to_string()),
            error => Self::Storage(Box::new(error)),
        }
    }
}

impl From<CredentialsServiceError> for SyncError {
    fn from(error: CredentialsServiceError) -> Self {
        match error {
            CredentialsServiceError::Missing(_) | CredentialsServiceError::NotFound => {
                Self::Configuration(error.to_string())
            }
            error => Self::Storage(Box::new(error)),
        }
    }
}

impl From<SyncCursorsServiceError> for SyncError {
    fn from(error: SyncCursorsServiceError) -> Self {
        match error {
            SyncCursorsServiceError::NotFound => {
                Self::Configuration("sync cursor is not provisioned".to_string())
            }
            error => Self::Storage(Box::new(error)),
        }
    }
}

impl From<TenantsServiceError> for SyncError {
    fn from(error: TenantsServiceError) -> Self {
        match error {
            TenantsServiceError::NotFound => Self::Configuration("tenant does not exist".to_string()),
            error => Self::Storage(Box::new(error)),
        }
    }
}

impl From<JobQueueError> for SyncError {
    fn from(error: JobQueueError) -> Self {
        Self::Storage(Box::new(error))
    }
}

impl From<JobAuditsServiceError> for SyncError {
    fn from(error: JobAuditsServiceError) -> Self {
        Self::Storage(Box::new(error))
    }
}

impl From<WebhookEventsServiceError> for SyncError {
    fn from(error: WebhookEventsServiceError) -> Self {
        Self::Storage(Box::new(error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classes_map_to_retry_decisions() {
        let missing = TranslationError::UnmappedProduct {
            product_id: "P1".to_string(),
        };

        assert!(SyncError::from(missing).is_retryable());
        assert!(SyncError::from(PlatformError::MissingData { platform: "erp" }).is_retryable());
        assert!(SyncError::TimedOut(Duration::from_secs(1)).is_retryable());
        assert!(!SyncError::Configuration("no credentials".to_string()).is_retryable());
        assert!(!SyncError::from(MappingsServiceError::Conflict).is_retryable());
        assert!(!SyncError::InvalidPayload("bad".to_string()).is_retryable());
    }

    #[test]
    fn missing_credentials_are_configuration_errors() {
        let error = SyncError::from(CredentialsServiceError::NotFound);

        assert_eq!(error.class(), "configuration");
        assert!(!error.is_retryable());
    }

    #[test]
    fn report_includes_source_chain() {
        let error = SyncError::from(TranslationError::UnmappedProduct {
            product_id: "P9".to_string(),
        });

        assert_eq!(error.report(), "translation failed: product `P9` is not mapped");
    }

    #[test]
    fn lost_lease_is_detected_through_the_box() {
        assert!(SyncError::from(JobQueueError::NotProcessing).is_lease_lost());
        assert!(!SyncError::from(JobQueueError::NotFound).is_lease_lost());
    }
}

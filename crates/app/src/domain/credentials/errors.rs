//! Credentials service errors.

use sqlx::{
    Error,
    error::{DatabaseError, ErrorKind},
};
use thiserror::Error;

use crate::domain::credentials::records::CredentialKind;

#[derive(Debug, Error)]
pub enum CredentialsServiceError {
    /// No active credential of this kind is configured for the tenant.
    #[error("credential {0} is missing or inactive")]
    Missing(CredentialKind),

    #[error("credential not found")]
    NotFound,

    #[error("tenant does not exist")]
    InvalidReference,

    #[error("invalid data")]
    InvalidData,

    #[error("storage error")]
    Sql(#[source] Error),
}

impl From<Error> for CredentialsServiceError {
    fn from(error: Error) -> Self {
        if matches!(error, Error::RowNotFound) {
            return Self::NotFound;
        }

        match error.as_database_error().map(DatabaseError::kind) {
            Some(ErrorKind::ForeignKeyViolation) => Self::InvalidReference,
            Some(ErrorKind::CheckViolation | ErrorKind::NotNullViolation) => Self::InvalidData,
            Some(ErrorKind::Other | _) | None => Self::Sql(error),
        }
    }
}

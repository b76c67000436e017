//! Mappings service errors.

use sqlx::{
    Error,
    error::{DatabaseError, ErrorKind},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MappingsServiceError {
    /// The write would pair an id that is already mapped to a different partner.
    #[error("mapping conflicts with an existing mapping")]
    Conflict,

    #[error("mapping not found")]
    NotFound,

    #[error("tenant does not exist")]
    InvalidReference,

    #[error("invalid data")]
    InvalidData,

    #[error("storage error")]
    Sql(#[source] Error),
}

impl From<Error> for MappingsServiceError {
    fn from(error: Error) -> Self {
        if matches!(error, Error::RowNotFound) {
            return Self::NotFound;
        }

        match error.as_database_error().map(DatabaseError::kind) {
            Some(ErrorKind::UniqueViolation) => Self::Conflict,
            Some(ErrorKind::ForeignKeyViolation) => Self::InvalidReference,
            Some(ErrorKind::CheckViolation | ErrorKind::NotNullViolation) => Self::InvalidData,
            Some(ErrorKind::Other | _) | None => Self::Sql(error),
        }
    }
}

/// Turn a lookup miss into `None`; callers treat a miss as "needs first-time translation".
pub trait OptionalMapping<T> {
    /// # Errors
    ///
    /// Returns every error other than [`MappingsServiceError::NotFound`].
    fn optional(self) -> Result<Option<T>, MappingsServiceError>;
}

impl<T> OptionalMapping<T> for Result<T, MappingsServiceError> {
    fn optional(self) -> Result<Option<T>, MappingsServiceError> {
        match self {
            Ok(value) => Ok(Some(value)),
            Err(MappingsServiceError::NotFound) => Ok(None),
            Err(error) => Err(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optional_maps_not_found_to_none() {
        let miss: Result<u8, MappingsServiceError> = Err(MappingsServiceError::NotFound);
        let hit: Result<u8, MappingsServiceError> = Ok(3);

        assert!(matches!(miss.optional(), Ok(None)));
        assert!(matches!(hit.optional(), Ok(Some(3))));
    }

    #[test]
    fn optional_keeps_other_errors() {
        let conflict: Result<u8, MappingsServiceError> = Err(MappingsServiceError::Conflict);

        assert!(matches!(
            conflict.optional(),
            Err(MappingsServiceError::Conflict)
        ));
    }
}

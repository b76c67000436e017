//! Credential Data

use crate::domain::credentials::{Secret, records::CredentialKind};

/// Credential to store, replacing any existing one of the same kind.
#[derive(Debug, Clone)]
pub struct NewCredential {
    pub kind: CredentialKind,
    pub secret: Secret,
}

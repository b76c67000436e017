//! Credential Records

use std::{fmt, str::FromStr};

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    domain::{credentials::Secret, tenants::records::TenantUuid},
    uuids::TypedUuid,
};

/// Credential UUID
pub type CredentialUuid = TypedUuid<CredentialRecord>;

/// Which platform secret a credential holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CredentialKind {
    EcommerceApiKey,
    ErpAppKey,
    ErpAppSecret,
}

impl CredentialKind {
    pub const ALL: [Self; 3] = [Self::EcommerceApiKey, Self::ErpAppKey, Self::ErpAppSecret];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::EcommerceApiKey => "ECOMMERCE_API_KEY",
            Self::ErpAppKey => "ERP_APP_KEY",
            Self::ErpAppSecret => "ERP_APP_SECRET",
        }
    }
}

impl fmt::Display for CredentialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown credential kind `{0}`")]
pub struct UnknownCredentialKind(pub String);

impl FromStr for CredentialKind {
    type Err = UnknownCredentialKind;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_uppercase().replace('-', "_").as_str() {
            "ECOMMERCE_API_KEY" => Ok(Self::EcommerceApiKey),
            "ERP_APP_KEY" => Ok(Self::ErpAppKey),
            "ERP_APP_SECRET" => Ok(Self::ErpAppSecret),
            _ => Err(UnknownCredentialKind(value.to_string())),
        }
    }
}

/// Credential Record
#[derive(Debug, Clone)]
pub struct CredentialRecord {
    pub uuid: CredentialUuid,
    pub tenant_uuid: TenantUuid,
    pub kind: CredentialKind,
    pub secret: Secret,
    pub active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Everything a tenant needs to talk to both platforms.
#[derive(Debug, Clone)]
pub struct TenantCredentials {
    pub tenant_uuid: TenantUuid,
    pub ecommerce_api_key: Secret,
    pub erp_app_key: Secret,
    pub erp_app_secret: Secret,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_parses_kebab_and_screaming_case() {
        assert_eq!(
            "erp-app-key".parse::<CredentialKind>(),
            Ok(CredentialKind::ErpAppKey)
        );
        assert_eq!(
            "ECOMMERCE_API_KEY".parse::<CredentialKind>(),
            Ok(CredentialKind::EcommerceApiKey)
        );
        assert!("password".parse::<CredentialKind>().is_err());
    }
}

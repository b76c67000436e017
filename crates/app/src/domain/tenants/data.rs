//! Tenant Data

use crate::domain::tenants::records::TenantUuid;

/// New Tenant Data
///
/// Creating a tenant also provisions one sync cursor per synchronised entity type.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTenant {
    /// UUID to assign to the tenant row.
    pub uuid: TenantUuid,

    /// Tenant name to persist.
    pub name: String,
}

impl NewTenant {
    /// A tenant with a freshly generated uuid.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            uuid: TenantUuid::new(),
            name: name.into(),
        }
    }
}

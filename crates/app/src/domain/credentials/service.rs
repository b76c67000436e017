//! Credentials service.

use async_trait::async_trait;
use mockall::automock;

use crate::{
    database::Db,
    domain::{
        credentials::{
            Secret,
            data::NewCredential,
            errors::CredentialsServiceError,
            records::{CredentialKind, CredentialRecord, TenantCredentials},
            repository::PgCredentialsRepository,
        },
        tenants::records::TenantUuid,
    },
};

#[derive(Debug, Clone)]
pub struct PgCredentialsService {
    db: Db,
    repository: PgCredentialsRepository,
}

impl PgCredentialsService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            repository: PgCredentialsRepository::new(),
        }
    }
}

#[async_trait]
impl CredentialsService for PgCredentialsService {
    async fn resolve(
        &self,
        tenant: TenantUuid,
    ) -> Result<TenantCredentials, CredentialsServiceError> {
        let mut tx = self.db.begin_tenant_transaction(tenant).await?;

        let records = self.repository.list_active_credentials(&mut tx).await?;

        tx.commit().await?;

        assemble(tenant, &records)
    }

    async fn set_credential(
        &self,
        tenant: TenantUuid,
        credential: NewCredential,
    ) -> Result<CredentialRecord, CredentialsServiceError> {
        if credential.secret.is_blank() {
            return Err(CredentialsServiceError::InvalidData);
        }

        let mut tx = self.db.begin_tenant_transaction(tenant).await?;

        let record = self
            .repository
            .upsert_credential(&mut tx, tenant, credential)
            .await?;

        tx.commit().await?;

        Ok(record)
    }

    async fn deactivate_credential(
        &self,
        tenant: TenantUuid,
        kind: CredentialKind,
    ) -> Result<CredentialRecord, CredentialsServiceError> {
        let mut tx = self.db.begin_tenant_transaction(tenant).await?;

        let record = self.repository.deactivate_credential(&mut tx, kind).await?;

        tx.commit().await?;

        Ok(record)
    }
}

/// Pick the active secret of every kind, failing on the first kind that has none.
pub fn assemble(
    tenant: TenantUuid,
    records: &[CredentialRecord],
) -> Result<TenantCredentials, CredentialsServiceError> {
    let find = |kind: CredentialKind| -> Result<Secret, CredentialsServiceError> {
        records
            .iter()
            .find(|record| record.kind == kind && record.active && !record.secret.is_blank())
            .map(|record| record.secret.clone())
            .ok_or(CredentialsServiceError::Missing(kind))
    };

    Ok(TenantCredentials {
        tenant_uuid: tenant,
        ecommerce_api_key: find(CredentialKind::EcommerceApiKey)?,
        erp_app_key: find(CredentialKind::ErpAppKey)?,
        erp_app_secret: find(CredentialKind::ErpAppSecret)?,
    })
}

#[automock]
#[async_trait]
pub trait CredentialsService: Send + Sync {
    /// Resolve the full credential set for a tenant.
    ///
    /// Fails with [`CredentialsServiceError::Missing`] when any kind is absent or inactive.
    async fn resolve(
        &self,
        tenant: TenantUuid,
    ) -> Result<TenantCredentials, CredentialsServiceError>;

    /// Store a credential, replacing and reactivating any existing one of the same kind.
    async fn set_credential(
        &self,
        tenant: TenantUuid,
        credential: NewCredential,
    ) -> Result<CredentialRecord, CredentialsServiceError>;

    async fn deactivate_credential(
        &self,
        tenant: TenantUuid,
        kind: CredentialKind,
    ) -> Result<CredentialRecord, CredentialsServiceError>;
}

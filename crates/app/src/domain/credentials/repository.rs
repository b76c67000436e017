//! Credentials Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query_as};

use crate::domain::{
    credentials::{
        Secret,
        data::NewCredential,
        records::{CredentialKind, CredentialRecord, CredentialUuid},
    },
    tenants::records::TenantUuid,
};

const UPSERT_CREDENTIAL_SQL: &str = include_str!("sql/upsert_credential.sql");
const LIST_ACTIVE_CREDENTIALS_SQL: &str = include_str!("sql/list_active_credentials.sql");
const DEACTIVATE_CREDENTIAL_SQL: &str = include_str!("sql/deactivate_credential.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgCredentialsRepository;

impl PgCredentialsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn upsert_credential(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        tenant: TenantUuid,
        credential: NewCredential,
    ) -> Result<CredentialRecord, sqlx::Error> {
        query_as::<Postgres, CredentialRecord>(UPSERT_CREDENTIAL_SQL)
            .bind(CredentialUuid::new().into_uuid())
            .bind(tenant.into_uuid())
            .bind(credential.kind.as_str())
            .bind(credential.secret.expose())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn list_active_credentials(
        &self,
        tx: &mut Transaction<'_, Postgres>,
    ) -> Result<Vec<CredentialRecord>, sqlx::Error> {
        query_as::<Postgres, CredentialRecord>(LIST_ACTIVE_CREDENTIALS_SQL)
            .fetch_all(&mut **tx)
            .await
    }

    pub(crate) async fn deactivate_credential(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        kind: CredentialKind,
    ) -> Result<CredentialRecord, sqlx::Error> {
        query_as::<Postgres, CredentialRecord>(DEACTIVATE_CREDENTIAL_SQL)
            .bind(kind.as_str())
            .fetch_one(&mut **tx)
            .await
    }
}

impl<'r> FromRow<'r, PgRow> for CredentialRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let kind: String = row.try_get("kind")?;

        Ok(Self {
            uuid: CredentialUuid::from_uuid(row.try_get("uuid")?),
            tenant_uuid: TenantUuid::from_uuid(row.try_get("tenant_uuid")?),
            kind: kind.parse().map_err(|error| sqlx::Error::ColumnDecode {
                index: "kind".to_string(),
                source: Box::new(error),
            })?,
            secret: Secret::new(row.try_get::<String, _>("secret")?),
            active: row.try_get("active")?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}

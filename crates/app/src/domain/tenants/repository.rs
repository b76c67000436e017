//! Tenants Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query_as};

use crate::domain::tenants::{
    data::NewTenant,
    records::{TenantRecord, TenantUuid},
};

const CREATE_TENANT_SQL: &str = include_str!("sql/create_tenant.sql");
const GET_TENANT_SQL: &str = include_str!("sql/get_tenant.sql");
const LIST_ACTIVE_TENANTS_SQL: &str = include_str!("sql/list_active_tenants.sql");
const DEACTIVATE_TENANT_SQL: &str = include_str!("sql/deactivate_tenant.sql");

#[derive(Debug, Clone, Default)]
/// PostgreSQL-backed tenants repository.
pub(crate) struct PgTenantsRepository;

impl PgTenantsRepository {
    /// Creates a new repository instance.
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn create_tenant(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        tenant: NewTenant,
    ) -> Result<TenantRecord, sqlx::Error> {
        query_as::<Postgres, TenantRecord>(CREATE_TENANT_SQL)
            .bind(tenant.uuid.into_uuid())
            .bind(tenant.name)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn get_tenant(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        tenant: TenantUuid,
    ) -> Result<TenantRecord, sqlx::Error> {
        query_as::<Postgres, TenantRecord>(GET_TENANT_SQL)
            .bind(tenant.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn list_active_tenants(
        &self,
        tx: &mut Transaction<'_, Postgres>,
    ) -> Result<Vec<TenantRecord>, sqlx::Error> {
        query_as::<Postgres, TenantRecord>(LIST_ACTIVE_TENANTS_SQL)
            .fetch_all(&mut **tx)
            .await
    }

    pub(crate) async fn deactivate_tenant(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        tenant: TenantUuid,
    ) -> Result<TenantRecord, sqlx::Error> {
        query_as::<Postgres, TenantRecord>(DEACTIVATE_TENANT_SQL)
            .bind(tenant.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }
}

impl<'r> FromRow<'r, PgRow> for TenantRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: TenantUuid::from_uuid(row.try_get("uuid")?),
            name: row.try_get("name")?,
            active: row.try_get("active")?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
            deactivated_at: row
                .try_get::<Option<SqlxTimestamp>, _>("deactivated_at")?
                .map(SqlxTimestamp::to_jiff),
        })
    }
}

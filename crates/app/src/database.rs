//! Database connection management

use sqlx::{PgPool, Postgres, Transaction, query, query_scalar};

use crate::domain::tenants::records::TenantUuid;

/// SQL used to set tenant context for row-level security.
pub const SET_TENANT_CONTEXT_SQL: &str = "SELECT set_config('app.current_tenant_uuid', $1, true)";

#[derive(Debug, Clone)]
pub struct Db {
    pool: PgPool,
}

impl Db {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Begin a transaction and set tenant context for RLS policies.
    ///
    /// # Errors
    ///
    /// Returns an error when starting the transaction or setting tenant context fails.
    pub async fn begin_tenant_transaction(
        &self,
        tenant: TenantUuid,
    ) -> Result<Transaction<'static, Postgres>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        query(SET_TENANT_CONTEXT_SQL)
            .bind(tenant.into_uuid().to_string())
            .execute(&mut *tx)
            .await?;

        Ok(tx)
    }

    /// Begin a transaction without tenant context, for cross-tenant system tables
    /// (tenants, job queue).
    ///
    /// # Errors
    ///
    /// Returns an error when starting the transaction fails.
    pub async fn begin_system_transaction(
        &self,
    ) -> Result<Transaction<'static, Postgres>, sqlx::Error> {
        self.pool.begin().await
    }

    /// Round-trip a trivial query; used by health checks.
    ///
    /// # Errors
    ///
    /// Returns an error when the database cannot be reached.
    pub async fn ping(&self) -> Result<(), sqlx::Error> {
        query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_one| ())
    }
}

/// Connect to `PostgreSQL`.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPool::connect(database_url).await
}

/// Refuse to run on a role that bypasses row-level security.
///
/// Superusers and `BYPASSRLS` roles ignore tenant policies even with `FORCE ROW LEVEL
/// SECURITY`, which would silently disable tenant isolation.
///
/// # Errors
///
/// Returns [`sqlx::Error::Configuration`] when the connected role bypasses RLS, or the
/// underlying error when the check itself fails.
pub async fn ensure_rls_enforced_role(pool: &PgPool) -> Result<(), sqlx::Error> {
    let bypasses: bool = query_scalar(
        "SELECT rolsuper OR rolbypassrls FROM pg_roles WHERE rolname = current_user",
    )
    .fetch_one(pool)
    .await?;

    if bypasses {
        return Err(sqlx::Error::Configuration(
            "connected role bypasses row-level security; use a restricted app role".into(),
        ));
    }

    Ok(())
}

/// Apply pending migrations.
///
/// # Errors
///
/// Returns an error when a migration fails to apply.
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../migrations").run(pool).await
}

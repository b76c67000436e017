//! Sync Cursors Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use serde_json::Value;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as};

use crate::domain::{
    cursors::{
        CursorValue,
        records::{SyncCursorRecord, SyncCursorUuid},
    },
    entities::EntityType,
    tenants::records::TenantUuid,
};

const CREATE_INITIAL_CURSOR_SQL: &str = include_str!("sql/create_initial_cursor.sql");
const GET_CURSOR_SQL: &str = include_str!("sql/get_cursor.sql");
const LOCK_CURSOR_SQL: &str = include_str!("sql/lock_cursor.sql");
const LIST_CURSORS_SQL: &str = include_str!("sql/list_cursors.sql");
const WRITE_CURSOR_SQL: &str = include_str!("sql/write_cursor.sql");
const RESET_CURSOR_SQL: &str = include_str!("sql/reset_cursor.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgSyncCursorsRepository;

impl PgSyncCursorsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    /// Insert an empty cursor; a no-op when one already exists.
    pub(crate) async fn create_initial_cursor(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        tenant: TenantUuid,
        entity_type: EntityType,
    ) -> Result<u64, sqlx::Error> {
        let result = query(CREATE_INITIAL_CURSOR_SQL)
            .bind(SyncCursorUuid::new().into_uuid())
            .bind(tenant.into_uuid())
            .bind(entity_type.as_str())
            .execute(&mut **tx)
            .await?;

        Ok(result.rows_affected())
    }

    pub(crate) async fn get_cursor(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        entity_type: EntityType,
    ) -> Result<SyncCursorRecord, sqlx::Error> {
        query_as::<Postgres, SyncCursorRecord>(GET_CURSOR_SQL)
            .bind(entity_type.as_str())
            .fetch_one(&mut **tx)
            .await
    }

    /// Read a cursor holding a row lock until the transaction ends.
    pub(crate) async fn lock_cursor(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        entity_type: EntityType,
    ) -> Result<SyncCursorRecord, sqlx::Error> {
        query_as::<Postgres, SyncCursorRecord>(LOCK_CURSOR_SQL)
            .bind(entity_type.as_str())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn list_cursors(
        &self,
        tx: &mut Transaction<'_, Postgres>,
    ) -> Result<Vec<SyncCursorRecord>, sqlx::Error> {
        query_as::<Postgres, SyncCursorRecord>(LIST_CURSORS_SQL)
            .fetch_all(&mut **tx)
            .await
    }

    pub(crate) async fn write_cursor(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        entity_type: EntityType,
        last_sync_id: &CursorValue,
        metadata: &Value,
    ) -> Result<SyncCursorRecord, sqlx::Error> {
        query_as::<Postgres, SyncCursorRecord>(WRITE_CURSOR_SQL)
            .bind(entity_type.as_str())
            .bind(last_sync_id.as_str())
            .bind(metadata)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn reset_cursor(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        entity_type: EntityType,
    ) -> Result<SyncCursorRecord, sqlx::Error> {
        query_as::<Postgres, SyncCursorRecord>(RESET_CURSOR_SQL)
            .bind(entity_type.as_str())
            .fetch_one(&mut **tx)
            .await
    }
}

impl<'r> FromRow<'r, PgRow> for SyncCursorRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: SyncCursorUuid::from_uuid(row.try_get("uuid")?),
            tenant_uuid: TenantUuid::from_uuid(row.try_get("tenant_uuid")?),
            entity_type: EntityType::decode(row, "entity_type")?,
            last_sync_id: row
                .try_get::<Option<String>, _>("last_sync_id")?
                .map(CursorValue::from),
            last_sync_at: row
                .try_get::<Option<SqlxTimestamp>, _>("last_sync_at")?
                .map(SqlxTimestamp::to_jiff),
            metadata: row.try_get("metadata")?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}

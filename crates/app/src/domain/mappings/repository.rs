//! Mappings Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as};

use crate::domain::{
    entities::EntityType,
    mappings::{
        data::NewMapping,
        records::{MappingRecord, MappingUuid},
    },
    tenants::records::TenantUuid,
};

const UPSERT_BY_ECOMMERCE_ID_SQL: &str = include_str!("sql/upsert_by_ecommerce_id.sql");
const UPSERT_BY_ERP_ID_SQL: &str = include_str!("sql/upsert_by_erp_id.sql");
const FIND_BY_ECOMMERCE_ID_SQL: &str = include_str!("sql/find_by_ecommerce_id.sql");
const FIND_BY_ERP_ID_SQL: &str = include_str!("sql/find_by_erp_id.sql");
const DELETE_MAPPING_SQL: &str = include_str!("sql/delete_mapping.sql");
const LIST_BY_ENTITY_TYPE_SQL: &str = include_str!("sql/list_by_entity_type.sql");

/// Which side of the pair an upsert is anchored on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Anchor {
    Ecommerce,
    Erp,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct PgMappingsRepository;

impl PgMappingsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn upsert_mapping(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        tenant: TenantUuid,
        mapping: NewMapping,
        anchor: Anchor,
    ) -> Result<MappingRecord, sqlx::Error> {
        let sql = match anchor {
            Anchor::Ecommerce => UPSERT_BY_ECOMMERCE_ID_SQL,
            Anchor::Erp => UPSERT_BY_ERP_ID_SQL,
        };

        query_as::<Postgres, MappingRecord>(sql)
            .bind(MappingUuid::new().into_uuid())
            .bind(tenant.into_uuid())
            .bind(mapping.entity_type.as_str())
            .bind(mapping.ecommerce_id)
            .bind(mapping.erp_id)
            .bind(mapping.metadata)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn find_by_ecommerce_id(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        entity_type: EntityType,
        ecommerce_id: &str,
    ) -> Result<MappingRecord, sqlx::Error> {
        query_as::<Postgres, MappingRecord>(FIND_BY_ECOMMERCE_ID_SQL)
            .bind(entity_type.as_str())
            .bind(ecommerce_id)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn find_by_erp_id(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        entity_type: EntityType,
        erp_id: &str,
    ) -> Result<MappingRecord, sqlx::Error> {
        query_as::<Postgres, MappingRecord>(FIND_BY_ERP_ID_SQL)
            .bind(entity_type.as_str())
            .bind(erp_id)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn delete_mapping(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        mapping: MappingUuid,
    ) -> Result<u64, sqlx::Error> {
        let result = query(DELETE_MAPPING_SQL)
            .bind(mapping.into_uuid())
            .execute(&mut **tx)
            .await?;

        Ok(result.rows_affected())
    }

    pub(crate) async fn list_by_entity_type(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        entity_type: EntityType,
    ) -> Result<Vec<MappingRecord>, sqlx::Error> {
        query_as::<Postgres, MappingRecord>(LIST_BY_ENTITY_TYPE_SQL)
            .bind(entity_type.as_str())
            .fetch_all(&mut **tx)
            .await
    }
}

impl<'r> FromRow<'r, PgRow> for MappingRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: MappingUuid::from_uuid(row.try_get("uuid")?),
            tenant_uuid: TenantUuid::from_uuid(row.try_get("tenant_uuid")?),
            entity_type: EntityType::decode(row, "entity_type")?,
            ecommerce_id: row.try_get("ecommerce_id")?,
            erp_id: row.try_get("erp_id")?,
            metadata: row.try_get("metadata")?,
            last_synced_at: row.try_get::<SqlxTimestamp, _>("last_synced_at")?.to_jiff(),
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}

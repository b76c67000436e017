//! Sync Cursor Records

use jiff::Timestamp;
use serde_json::Value;

use crate::{
    domain::{cursors::CursorValue, entities::EntityType, tenants::records::TenantUuid},
    uuids::TypedUuid,
};

/// Sync Cursor UUID
pub type SyncCursorUuid = TypedUuid<SyncCursorRecord>;

/// Sync Cursor Record
#[derive(Debug, Clone, PartialEq)]
pub struct SyncCursorRecord {
    pub uuid: SyncCursorUuid,
    pub tenant_uuid: TenantUuid,
    pub entity_type: EntityType,

    /// Last native id durably synchronised; `None` until the first batch commits.
    pub last_sync_id: Option<CursorValue>,
    pub last_sync_at: Option<Timestamp>,
    pub metadata: Value,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

//! Mapping Records

use jiff::Timestamp;
use serde_json::Value;

use crate::{
    domain::{entities::EntityType, tenants::records::TenantUuid},
    uuids::TypedUuid,
};

/// Mapping UUID
pub type MappingUuid = TypedUuid<MappingRecord>;

/// Mapping Record
#[derive(Debug, Clone, PartialEq)]
pub struct MappingRecord {
    pub uuid: MappingUuid,
    pub tenant_uuid: TenantUuid,
    pub entity_type: EntityType,

    /// Identifier on the e-commerce platform.
    pub ecommerce_id: String,

    /// Identifier on the ERP platform.
    pub erp_id: String,

    /// Snapshot of both sides at the last sync.
    pub metadata: Value,
    pub last_synced_at: Timestamp,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

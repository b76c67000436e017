//! Mapping Data

use serde_json::Value;

use crate::domain::entities::EntityType;

/// Mapping to insert or refresh.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMapping {
    pub entity_type: EntityType,
    pub ecommerce_id: String,
    pub erp_id: String,
    pub metadata: Value,
}

//! Webhook Event Records

use std::{fmt, str::FromStr};

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::{domain::tenants::records::TenantUuid, uuids::TypedUuid};

/// Webhook Event UUID
pub type WebhookEventUuid = TypedUuid<WebhookEventRecord>;

/// Platform a notification came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WebhookSource {
    Ecommerce,
    Erp,
}

impl WebhookSource {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ecommerce => "ecommerce",
            Self::Erp => "erp",
        }
    }
}

impl fmt::Display for WebhookSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown webhook source `{0}`")]
pub struct UnknownWebhookSource(pub String);

impl FromStr for WebhookSource {
    type Err = UnknownWebhookSource;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "ecommerce" => Ok(Self::Ecommerce),
            "erp" => Ok(Self::Erp),
            _ => Err(UnknownWebhookSource(value.to_string())),
        }
    }
}

/// Webhook Event Record
#[derive(Debug, Clone, PartialEq)]
pub struct WebhookEventRecord {
    pub uuid: WebhookEventUuid,
    pub tenant_uuid: TenantUuid,
    pub source: WebhookSource,
    pub event_type: String,

    /// Body exactly as received.
    pub payload: Value,

    /// Set once every job derived from the event is durably enqueued.
    pub processed: bool,
    pub processed_at: Option<Timestamp>,

    /// Set when the event can never yield work; it is not replayed.
    pub rejected_at: Option<Timestamp>,
    pub error: Option<String>,
    pub created_at: Timestamp,
}

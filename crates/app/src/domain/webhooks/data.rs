//! Webhook Event Data

use serde_json::Value;

use crate::domain::webhooks::records::WebhookSource;

/// Notification to record.
#[derive(Debug, Clone, PartialEq)]
pub struct NewWebhookEvent {
    pub source: WebhookSource,

    /// Event name as sent, or `unknown` when absent.
    pub event_type: String,
    pub payload: Value,
}

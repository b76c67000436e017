//! Webhook ingress
//!
//! Records every notification before acting on it, derives work items from the known
//! events and enqueues them. The caller is acknowledged once the jobs are queued, not
//! once they run.

use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    domain::{
        jobs::{data::EnqueueOutcome, records::{JobUuid, Operation}},
        tenants::{TenantsService, TenantsServiceError, records::TenantUuid},
        webhooks::{
            WebhookEventsService,
            data::NewWebhookEvent,
            records::{WebhookEventRecord, WebhookEventUuid, WebhookSource},
        },
    },
    engine::{Dispatcher, JobPayload, SyncError, WorkItem},
};

/// Event name stored when the body carries none.
pub const UNKNOWN_EVENT: &str = "unknown";

#[derive(Debug, Error)]
pub enum IngressError {
    #[error("tenant does not exist")]
    UnknownTenant,

    #[error("tenant is inactive")]
    TenantInactive,

    /// The event was recorded but names no usable entity.
    #[error("event {event} is missing `{field}` in its data")]
    InvalidEvent { event: String, field: &'static str },

    #[error(transparent)]
    Sync(#[from] SyncError),
}

impl IngressError {
    /// Whether a later replay of the same event could succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Sync(error) => error.is_retryable(),
            Self::UnknownTenant | Self::TenantInactive | Self::InvalidEvent { .. } => false,
        }
    }
}

impl From<TenantsServiceError> for IngressError {
    fn from(error: TenantsServiceError) -> Self {
        match error {
            TenantsServiceError::NotFound => Self::UnknownTenant,
            error => Self::Sync(error.into()),
        }
    }
}

/// Acknowledgement returned to the sender.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngressReceipt {
    pub event: WebhookEventUuid,
    pub event_type: String,
    pub jobs: Vec<QueuedJob>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueuedJob {
    pub uuid: JobUuid,
    /// The same work was already queued by an earlier delivery.
    pub duplicate: bool,
}

/// Derive the work item for a notification body, if the event is one we act on.
///
/// Jobs are keyed `{source}:{event}:{entity id}:{timestamp}`. Redelivery of one
/// notification carries the same timestamp and collapses onto one job, while a later
/// update, re-creation or second delete of the same entity is a new job. Bodies without
/// a timestamp fall back to `{source}:{event}:{entity id}`.
///
/// # Errors
///
/// Returns [`IngressError::InvalidEvent`] when a known event lacks its entity id.
pub fn derive_work(
    tenant: TenantUuid,
    source: WebhookSource,
    body: &Value,
) -> Result<Option<WorkItem>, IngressError> {
    let event = event_type(body);
    let data = body.get("data").unwrap_or(&Value::Null);

    let (operation, entity_id, payload) = match (source, event.as_str()) {
        (WebhookSource::Ecommerce, "order.created" | "order.updated") => {
            let order_id = entity_id(&event, data, &["id", "order_id"])?;
            let operation = if event == "order.created" {
                Operation::Create
            } else {
                Operation::Update
            };

            (
                operation,
                order_id.clone(),
                JobPayload::Order { order_id },
            )
        }
        (WebhookSource::Erp, "product.created" | "product.updated" | "product.deleted") => {
            let code = entity_id(&event, data, &["code", "id"])?;
            let operation = match event.as_str() {
                "product.created" => Operation::Create,
                "product.updated" => Operation::Update,
                _ => Operation::Delete,
            };

            (operation, code.clone(), JobPayload::Product { code })
        }
        _ => return Ok(None),
    };

    let source_event_id = match event_timestamp(body) {
        Some(timestamp) => format!("{source}:{event}:{entity_id}:{timestamp}"),
        None => format!("{source}:{event}:{entity_id}"),
    };

    Ok(Some(WorkItem {
        tenant,
        operation,
        source_event_id: Some(source_event_id),
        payload,
    }))
}

/// The body's `event` field, or [`UNKNOWN_EVENT`].
#[must_use]
pub fn event_type(body: &Value) -> String {
    body.get("event")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|event| !event.is_empty())
        .unwrap_or(UNKNOWN_EVENT)
        .to_string()
}

/// The body's `timestamp`, verbatim for strings and rendered for numbers.
fn event_timestamp(body: &Value) -> Option<String> {
    match body.get("timestamp")? {
        Value::String(value) if !value.trim().is_empty() => Some(value.trim().to_string()),
        Value::Number(value) => Some(value.to_string()),
        _ => None,
    }
}

/// First non-blank string or number among `fields` of `data`.
fn entity_id(event: &str, data: &Value, fields: &[&'static str]) -> Result<String, IngressError> {
    fields
        .iter()
        .find_map(|field| match data.get(field) {
            Some(Value::String(value)) if !value.trim().is_empty() => Some(value.trim().to_string()),
            Some(Value::Number(value)) => Some(value.to_string()),
            _ => None,
        })
        .ok_or_else(|| IngressError::InvalidEvent {
            event: event.to_string(),
            field: fields.first().copied().unwrap_or("id"),
        })
}

#[derive(Clone)]
pub struct WebhookIngress {
    tenants: Arc<dyn TenantsService>,
    events: Arc<dyn WebhookEventsService>,
    dispatcher: Dispatcher,
}

impl WebhookIngress {
    #[must_use]
    pub fn new(
        tenants: Arc<dyn TenantsService>,
        events: Arc<dyn WebhookEventsService>,
        dispatcher: Dispatcher,
    ) -> Self {
        Self {
            tenants,
            events,
            dispatcher,
        }
    }

    /// Record `body`, enqueue the jobs it implies and mark it processed.
    ///
    /// # Errors
    ///
    /// Fails for unknown or inactive tenants before anything is recorded. Once recorded,
    /// an event that can never yield work is rejected, and one whose jobs could not be
    /// enqueued for a transient reason stays unprocessed for replay.
    pub async fn receive(
        &self,
        tenant: TenantUuid,
        source: WebhookSource,
        body: Value,
    ) -> Result<IngressReceipt, IngressError> {
        let record = self.tenants.get_tenant(tenant).await?;

        if !record.active {
            return Err(IngressError::TenantInactive);
        }

        let event = self
            .events
            .record(
                tenant,
                NewWebhookEvent {
                    source,
                    event_type: event_type(&body),
                    payload: body,
                },
            )
            .await
            .map_err(SyncError::from)?;

        debug!(%tenant, %source, event = %event.uuid, event_type = %event.event_type, "webhook recorded");

        self.dispatch(&event).await
    }

    /// Re-drive events that were recorded but never marked processed, e.g. after a crash
    /// between recording and enqueueing. Rejected events are skipped. Deduplication keeps
    /// redelivery harmless.
    ///
    /// Returns how many events were processed.
    ///
    /// # Errors
    ///
    /// Returns an error when the unprocessed events cannot be listed.
    pub async fn replay_unprocessed(
        &self,
        tenant: TenantUuid,
        limit: u32,
    ) -> Result<usize, IngressError> {
        let pending = self
            .events
            .list_unprocessed(tenant, limit)
            .await
            .map_err(SyncError::from)?;

        let mut replayed = 0;

        for event in &pending {
            match self.dispatch(event).await {
                Ok(_receipt) => replayed += 1,
                Err(error) => {
                    warn!(%tenant, event = %event.uuid, error = %error, "webhook replay failed");
                }
            }
        }

        if replayed > 0 {
            info!(%tenant, replayed, "replayed unprocessed webhooks");
        }

        Ok(replayed)
    }

    async fn dispatch(&self, event: &WebhookEventRecord) -> Result<IngressReceipt, IngressError> {
        let tenant = event.tenant_uuid;

        let queued = match self.enqueue(event).await {
            Ok(queued) => queued,
            Err(error) => {
                let marked = if error.is_retryable() {
                    self.events
                        .mark_failed(tenant, event.uuid, error.to_string())
                        .await
                } else {
                    self.events
                        .mark_rejected(tenant, event.uuid, error.to_string())
                        .await
                };

                if let Err(mark_error) = marked {
                    warn!(%tenant, event = %event.uuid, error = %mark_error, "could not flag webhook failure");
                }

                return Err(error);
            }
        };

        self.events
            .mark_processed(tenant, event.uuid)
            .await
            .map_err(SyncError::from)?;

        Ok(IngressReceipt {
            event: event.uuid,
            event_type: event.event_type.clone(),
            jobs: queued.into_iter().collect(),
        })
    }

    async fn enqueue(&self, event: &WebhookEventRecord) -> Result<Option<QueuedJob>, IngressError> {
        let Some(item) = derive_work(event.tenant_uuid, event.source, &event.payload)? else {
            debug!(event = %event.uuid, event_type = %event.event_type, "no work for event");
            return Ok(None);
        };

        let outcome = self.dispatcher.enqueue(item).await?;

        Ok(Some(QueuedJob {
            uuid: outcome.job().uuid,
            duplicate: matches!(outcome, EnqueueOutcome::Duplicate(_)),
        }))
    }
}

impl std::fmt::Debug for WebhookIngress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookIngress")
            .field("dispatcher", &self.dispatcher)
            .finish_non_exhaustive()
    }
}

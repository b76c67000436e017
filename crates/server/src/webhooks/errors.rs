//! Webhook Errors

use salvo::http::StatusError;
use tracing::{error, warn};

use syncbridge_app::engine::IngressError;

pub(crate) fn into_status_error(error: IngressError) -> StatusError {
    match error {
        IngressError::UnknownTenant => StatusError::not_found().brief("Tenant not found"),
        IngressError::TenantInactive => StatusError::forbidden().brief("Tenant is inactive"),
        IngressError::InvalidEvent { event, field } => {
            warn!(%event, field, "webhook recorded without a usable entity id");

            StatusError::unprocessable_entity().brief("Event is missing its entity id")
        }
        IngressError::Sync(source) if source.is_retryable() => {
            error!("failed to accept webhook: {}", source.report());

            StatusError::service_unavailable().brief("Webhook could not be queued, retry later")
        }
        IngressError::Sync(source) => {
            error!("failed to accept webhook: {}", source.report());

            StatusError::internal_server_error()
        }
    }
}

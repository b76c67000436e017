//! Receive Webhook Handler

use salvo::{
    oapi::{ToSchema, extract::PathParam},
    prelude::*,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use syncbridge_app::{
    domain::{tenants::records::TenantUuid, webhooks::records::WebhookSource},
    engine::{IngressReceipt, QueuedJob},
};

use crate::{extensions::*, webhooks::errors::into_status_error};

/// Job queued for an accepted notification
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct AcceptedJob {
    /// Job UUID
    pub uuid: Uuid,

    /// The job already existed from an earlier delivery
    pub duplicate: bool,
}

impl From<QueuedJob> for AcceptedJob {
    fn from(job: QueuedJob) -> Self {
        Self {
            uuid: job.uuid.into(),
            duplicate: job.duplicate,
        }
    }
}

/// Webhook Accepted Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct WebhookAcceptedResponse {
    /// Recorded event UUID
    pub event: Uuid,

    /// Event name taken from the body
    pub event_type: String,

    /// Jobs derived from the event; empty for events that need no work
    pub jobs: Vec<AcceptedJob>,
}

impl From<IngressReceipt> for WebhookAcceptedResponse {
    fn from(receipt: IngressReceipt) -> Self {
        Self {
            event: receipt.event.into(),
            event_type: receipt.event_type,
            jobs: receipt.jobs.into_iter().map(AcceptedJob::from).collect(),
        }
    }
}

/// Receive Webhook Handler
///
/// Records the notification, queues the work it implies and acknowledges with 202.
/// Processing happens later on the worker pools.
#[endpoint(
    tags("webhooks"),
    summary = "Receive platform notification",
    responses(
        (status_code = StatusCode::ACCEPTED, description = "Notification recorded and queued"),
        (status_code = StatusCode::BAD_REQUEST, description = "Malformed tenant id or body"),
        (status_code = StatusCode::NOT_FOUND, description = "Unknown tenant or source"),
        (status_code = StatusCode::FORBIDDEN, description = "Tenant is inactive"),
        (status_code = StatusCode::UNPROCESSABLE_ENTITY, description = "Event is missing its entity id"),
        (status_code = StatusCode::SERVICE_UNAVAILABLE, description = "Work could not be queued"),
    ),
)]
pub(crate) async fn handler(
    tenant_uuid: PathParam<String>,
    source: PathParam<String>,
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
) -> Result<Json<WebhookAcceptedResponse>, StatusError> {
    let state = depot.state_or_500()?;

    let source = source
        .into_inner()
        .parse::<WebhookSource>()
        .map_err(|error| StatusError::not_found().brief(error.to_string()))?;

    let tenant = tenant_uuid
        .into_inner()
        .parse::<Uuid>()
        .map(TenantUuid::from_uuid)
        .or_400("Invalid tenant uuid")?;

    let body = req
        .parse_json::<Value>()
        .await
        .or_400("Webhook body must be JSON")?;

    let receipt = state
        .ingress
        .receive(tenant, source, body)
        .await
        .map_err(into_status_error)?;

    res.status_code(StatusCode::ACCEPTED);

    Ok(Json(receipt.into()))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use serde_json::json;
    use testresult::TestResult;

    use syncbridge_app::domain::{
        jobs::{JobQueueError, data::EnqueueOutcome},
        tenants::TenantsServiceError,
    };

    use crate::test_helpers::{
        StrictMocks, TEST_TENANT_UUID, event_record, job_record, state_with, stub_event,
        tenant_record, webhooks_service,
    };

    use super::*;

    fn url(source: &str) -> String {
        format!("http://example.com/tenants/{TEST_TENANT_UUID}/webhooks/{source}")
    }

    fn active_tenant(mocks: &mut StrictMocks) {
        mocks
            .tenants
            .expect_get_tenant()
            .once()
            .withf(|tenant| *tenant == TEST_TENANT_UUID)
            .returning(|tenant| Ok(tenant_record(tenant, true)));
    }

    fn recording(mocks: &mut StrictMocks) {
        mocks
            .webhooks
            .expect_record()
            .once()
            .returning(|tenant, event| Ok(event_record(tenant, event)));
    }

    #[tokio::test]
    async fn order_created_is_accepted_with_its_job() -> TestResult {
        let mut mocks = StrictMocks::default();

        active_tenant(&mut mocks);
        recording(&mut mocks);

        mocks
            .jobs
            .expect_enqueue()
            .once()
            .withf(|tenant, job| {
                *tenant == TEST_TENANT_UUID
                    && job.source_event_id.as_deref() == Some("ecommerce:order.created:ORD-1")
            })
            .returning(|tenant, job| Ok(EnqueueOutcome::Enqueued(job_record(tenant, job))));

        mocks
            .webhooks
            .expect_mark_processed()
            .once()
            .returning(|tenant, _event| Ok(stub_event(tenant)));

        let mut res = TestClient::post(url("ecommerce"))
            .json(&json!({ "event": "order.created", "data": { "id": "ORD-1" } }))
            .send(&webhooks_service(state_with(mocks)?))
            .await;

        let body: WebhookAcceptedResponse = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::ACCEPTED));
        assert_eq!(body.event_type, "order.created");
        assert_eq!(body.jobs.len(), 1);
        assert!(
            body.jobs.iter().all(|job| !job.duplicate),
            "first delivery queues a fresh job"
        );

        Ok(())
    }

    #[tokio::test]
    async fn redelivery_reports_the_existing_job_as_duplicate() -> TestResult {
        let mut mocks = StrictMocks::default();

        active_tenant(&mut mocks);
        recording(&mut mocks);

        mocks
            .jobs
            .expect_enqueue()
            .once()
            .returning(|tenant, job| Ok(EnqueueOutcome::Duplicate(job_record(tenant, job))));

        mocks
            .webhooks
            .expect_mark_processed()
            .once()
            .returning(|tenant, _event| Ok(stub_event(tenant)));

        let mut res = TestClient::post(url("erp"))
            .json(&json!({ "event": "product.created", "data": { "code": "SKU-9" } }))
            .send(&webhooks_service(state_with(mocks)?))
            .await;

        let body: WebhookAcceptedResponse = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::ACCEPTED));
        assert!(
            body.jobs.iter().all(|job| job.duplicate),
            "redelivery must not queue a second job"
        );

        Ok(())
    }

    #[tokio::test]
    async fn unknown_source_is_not_found() -> TestResult {
        let res = TestClient::post(url("crm"))
            .json(&json!({ "event": "order.created" }))
            .send(&webhooks_service(state_with(StrictMocks::default())?))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::NOT_FOUND));

        Ok(())
    }

    #[tokio::test]
    async fn malformed_tenant_uuid_is_a_bad_request() -> TestResult {
        let res = TestClient::post("http://example.com/tenants/not-a-uuid/webhooks/erp")
            .json(&json!({ "event": "product.created" }))
            .send(&webhooks_service(state_with(StrictMocks::default())?))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));

        Ok(())
    }

    #[tokio::test]
    async fn non_json_body_is_a_bad_request() -> TestResult {
        let res = TestClient::post(url("erp"))
            .text("not json")
            .send(&webhooks_service(state_with(StrictMocks::default())?))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));

        Ok(())
    }

    #[tokio::test]
    async fn unknown_tenant_is_not_found() -> TestResult {
        let mut mocks = StrictMocks::default();

        mocks
            .tenants
            .expect_get_tenant()
            .once()
            .returning(|_tenant| Err(TenantsServiceError::NotFound));

        let res = TestClient::post(url("erp"))
            .json(&json!({ "event": "product.created", "data": { "code": "SKU-9" } }))
            .send(&webhooks_service(state_with(mocks)?))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::NOT_FOUND));

        Ok(())
    }

    #[tokio::test]
    async fn inactive_tenant_is_forbidden() -> TestResult {
        let mut mocks = StrictMocks::default();

        mocks
            .tenants
            .expect_get_tenant()
            .once()
            .returning(|tenant| Ok(tenant_record(tenant, false)));

        let res = TestClient::post(url("erp"))
            .json(&json!({ "event": "product.created", "data": { "code": "SKU-9" } }))
            .send(&webhooks_service(state_with(mocks)?))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::FORBIDDEN));

        Ok(())
    }

    #[tokio::test]
    async fn event_without_entity_id_is_unprocessable() -> TestResult {
        let mut mocks = StrictMocks::default();

        active_tenant(&mut mocks);
        recording(&mut mocks);

        mocks
            .webhooks
            .expect_mark_rejected()
            .once()
            .returning(|tenant, _event, _error| Ok(stub_event(tenant)));

        let res = TestClient::post(url("ecommerce"))
            .json(&json!({ "event": "order.created", "data": {} }))
            .send(&webhooks_service(state_with(mocks)?))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::UNPROCESSABLE_ENTITY));

        Ok(())
    }

    #[tokio::test]
    async fn queue_outage_asks_the_sender_to_retry() -> TestResult {
        let mut mocks = StrictMocks::default();

        active_tenant(&mut mocks);
        recording(&mut mocks);

        mocks
            .jobs
            .expect_enqueue()
            .once()
            .returning(|_tenant, _job| Err(JobQueueError::Sql(sqlx::Error::PoolTimedOut)));

        mocks
            .webhooks
            .expect_mark_failed()
            .once()
            .returning(|tenant, _event, _error| Ok(stub_event(tenant)));

        let res = TestClient::post(url("ecommerce"))
            .json(&json!({ "event": "order.created", "data": { "id": "ORD-2" } }))
            .send(&webhooks_service(state_with(mocks)?))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::SERVICE_UNAVAILABLE));

        Ok(())
    }
}

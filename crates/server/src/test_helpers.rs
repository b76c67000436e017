//! Test helpers.

use std::{sync::Arc, time::Duration};

use jiff::Timestamp;
use salvo::{affix_state::inject, prelude::*};
use serde_json::json;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use syncbridge_app::{
    database::Db,
    domain::{
        jobs::{
            MockJobQueue, RetryPolicy,
            data::NewJob,
            records::{JobRecord, JobStatus},
        },
        tenants::{
            MockTenantsService,
            records::{TenantRecord, TenantUuid},
        },
        webhooks::{
            MockWebhookEventsService,
            data::NewWebhookEvent,
            records::{WebhookEventRecord, WebhookEventUuid, WebhookSource},
        },
    },
    engine::{Dispatcher, WebhookIngress},
};

use crate::{state::State, webhooks};

pub(crate) const TEST_TENANT_UUID: TenantUuid = TenantUuid::from_uuid(Uuid::nil());

/// Mocks that panic on any call the test did not expect.
#[derive(Default)]
pub(crate) struct StrictMocks {
    pub(crate) tenants: MockTenantsService,
    pub(crate) webhooks: MockWebhookEventsService,
    pub(crate) jobs: MockJobQueue,
}

/// Pool pointed at a closed port, so pings fail fast.
fn unreachable_db() -> Result<Db, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .acquire_timeout(Duration::from_millis(250))
        .connect_lazy("postgres://syncbridge@127.0.0.1:1/syncbridge")?;

    Ok(Db::new(pool))
}

pub(crate) fn state_with(mocks: StrictMocks) -> Result<Arc<State>, sqlx::Error> {
    let dispatcher = Dispatcher::new(Arc::new(mocks.jobs), RetryPolicy::default());
    let ingress = WebhookIngress::new(
        Arc::new(mocks.tenants),
        Arc::new(mocks.webhooks),
        dispatcher,
    );

    Ok(Arc::new(State::new(ingress, unreachable_db()?)))
}

pub(crate) fn webhooks_service(state: Arc<State>) -> Service {
    Service::new(
        Router::new().hoop(inject(state)).push(
            Router::with_path("tenants/{tenant_uuid}/webhooks/{source}")
                .post(webhooks::receive::handler),
        ),
    )
}

pub(crate) fn tenant_record(uuid: TenantUuid, active: bool) -> TenantRecord {
    TenantRecord {
        uuid,
        name: "Test Tenant".to_string(),
        active,
        created_at: Timestamp::now(),
        updated_at: Timestamp::now(),
        deactivated_at: (!active).then(Timestamp::now),
    }
}

pub(crate) fn event_record(tenant: TenantUuid, event: NewWebhookEvent) -> WebhookEventRecord {
    WebhookEventRecord {
        uuid: WebhookEventUuid::new(),
        tenant_uuid: tenant,
        source: event.source,
        event_type: event.event_type,
        payload: event.payload,
        processed: false,
        processed_at: None,
        rejected_at: None,
        error: None,
        created_at: Timestamp::now(),
    }
}

/// Event record for mark calls whose return value the ingress ignores.
pub(crate) fn stub_event(tenant: TenantUuid) -> WebhookEventRecord {
    event_record(
        tenant,
        NewWebhookEvent {
            source: WebhookSource::Erp,
            event_type: "product.created".to_string(),
            payload: json!({}),
        },
    )
}

pub(crate) fn job_record(tenant: TenantUuid, job: NewJob) -> JobRecord {
    JobRecord {
        uuid: job.uuid,
        tenant_uuid: tenant,
        queue: job.queue,
        entity_type: job.entity_type,
        operation: job.operation,
        source_event_id: job.source_event_id,
        payload: job.payload,
        status: JobStatus::Pending,
        attempts: 0,
        retry_policy: job.retry_policy,
        available_at: Timestamp::now(),
        lease_expires_at: None,
        last_error: None,
        created_at: Timestamp::now(),
        updated_at: Timestamp::now(),
    }
}

use std::sync::Arc;

use clap::Args;
use syncbridge_app::{
    domain::{
        entities::EntityType,
        jobs::{PgJobQueue, RetryPolicy},
        tenants::records::TenantUuid,
    },
    engine::{CURSOR_SYNC_ENTITIES, Dispatcher, WorkItem},
};
use uuid::Uuid;

use crate::cli::connect;

#[derive(Debug, Args)]
pub(crate) struct TriggerSyncArgs {
    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: String,

    #[arg(long)]
    tenant_uuid: Uuid,

    /// Entity type to pull; every pullable type when omitted
    #[arg(long)]
    entity_type: Option<EntityType>,
}

pub(crate) async fn run(args: TriggerSyncArgs) -> Result<(), String> {
    let entity_types = match args.entity_type {
        Some(entity_type) if !CURSOR_SYNC_ENTITIES.contains(&entity_type) => {
            return Err(format!("cursor sync is not supported for {entity_type}"));
        }
        Some(entity_type) => vec![entity_type],
        None => CURSOR_SYNC_ENTITIES.to_vec(),
    };

    let dispatcher = Dispatcher::new(
        Arc::new(PgJobQueue::new(connect(&args.database_url).await?)),
        RetryPolicy::default(),
    );
    let tenant = TenantUuid::from_uuid(args.tenant_uuid);

    for entity_type in entity_types {
        let outcome = dispatcher
            .enqueue(WorkItem::cursor_sync(tenant, entity_type, 1))
            .await
            .map_err(|error| format!("failed to queue {entity_type} sync: {}", error.report()))?;

        println!("queued {entity_type} sync: job {}", outcome.job().uuid);
    }

    Ok(())
}

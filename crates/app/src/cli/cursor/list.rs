use clap::Args;
use syncbridge_app::domain::{
    cursors::{PgSyncCursorsService, SyncCursorsService},
    tenants::records::TenantUuid,
};
use uuid::Uuid;

use crate::cli::connect;

#[derive(Debug, Args)]
pub(crate) struct ListCursorsArgs {
    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: String,

    #[arg(long)]
    tenant_uuid: Uuid,
}

pub(crate) async fn run(args: ListCursorsArgs) -> Result<(), String> {
    let service = PgSyncCursorsService::new(connect(&args.database_url).await?);

    let cursors = service
        .list_cursors(TenantUuid::from_uuid(args.tenant_uuid))
        .await
        .map_err(|error| format!("failed to list cursors: {error}"))?;

    for cursor in cursors {
        println!(
            "{}: {} (last synced {})",
            cursor.entity_type,
            cursor
                .last_sync_id
                .map_or_else(|| "-".to_string(), |value| value.into_string()),
            cursor
                .last_sync_at
                .map_or_else(|| "never".to_string(), |value| value.to_string())
        );
    }

    Ok(())
}

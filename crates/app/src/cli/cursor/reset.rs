use clap::Args;
use syncbridge_app::domain::{
    cursors::{PgSyncCursorsService, SyncCursorsService},
    entities::EntityType,
    tenants::records::TenantUuid,
};
use uuid::Uuid;

use crate::cli::connect;

#[derive(Debug, Args)]
pub(crate) struct ResetCursorArgs {
    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: String,

    #[arg(long)]
    tenant_uuid: Uuid,

    /// Entity type whose watermark is cleared, e.g. product
    #[arg(long)]
    entity_type: EntityType,
}

pub(crate) async fn run(args: ResetCursorArgs) -> Result<(), String> {
    let service = PgSyncCursorsService::new(connect(&args.database_url).await?);

    let cursor = service
        .reset_cursor(TenantUuid::from_uuid(args.tenant_uuid), args.entity_type)
        .await
        .map_err(|error| format!("failed to reset cursor: {error}"))?;

    println!(
        "reset {} cursor for tenant {}; the next sync starts from the beginning",
        cursor.entity_type, cursor.tenant_uuid
    );

    Ok(())
}

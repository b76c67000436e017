use clap::Args;
use syncbridge_app::domain::tenants::{PgTenantsService, TenantsService, records::TenantUuid};
use uuid::Uuid;

use crate::cli::connect;

#[derive(Debug, Args)]
pub(crate) struct DeactivateTenantArgs {
    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: String,

    /// Tenant to deactivate
    #[arg(long)]
    tenant_uuid: Uuid,
}

pub(crate) async fn run(args: DeactivateTenantArgs) -> Result<(), String> {
    let service = PgTenantsService::new(connect(&args.database_url).await?);

    let tenant = service
        .deactivate_tenant(TenantUuid::from_uuid(args.tenant_uuid))
        .await
        .map_err(|error| format!("failed to deactivate tenant: {error}"))?;

    println!("tenant_uuid: {}", tenant.uuid);
    println!(
        "deactivated_at: {}",
        tenant
            .deactivated_at
            .map_or_else(|| "unknown".to_string(), |value| value.to_string())
    );

    Ok(())
}

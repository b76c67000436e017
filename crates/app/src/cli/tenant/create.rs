use clap::Args;
use syncbridge_app::domain::tenants::{
    PgTenantsService, TenantsService, data::NewTenant, records::TenantUuid,
};
use uuid::Uuid;

use crate::cli::connect;

#[derive(Debug, Args)]
pub(crate) struct CreateTenantArgs {
    /// Tenant display name
    #[arg(long)]
    name: String,

    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: String,

    /// Optional tenant UUID; generated when omitted
    #[arg(long)]
    tenant_uuid: Option<Uuid>,
}

pub(crate) async fn run(args: CreateTenantArgs) -> Result<(), String> {
    let service = PgTenantsService::new(connect(&args.database_url).await?);
    let mut tenant = NewTenant::named(args.name);

    if let Some(uuid) = args.tenant_uuid {
        tenant.uuid = TenantUuid::from_uuid(uuid);
    }

    let tenant = service
        .create_tenant(tenant)
        .await
        .map_err(|error| format!("failed to create tenant: {error}"))?;

    println!("tenant_uuid: {}", tenant.uuid);
    println!("tenant_name: {}", tenant.name);
    println!("set credentials next: syncbridge-app credential set --tenant-uuid {}", tenant.uuid);

    Ok(())
}

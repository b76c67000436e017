use clap::Args;
use syncbridge_app::domain::{
    credentials::{CredentialsService, PgCredentialsService, records::CredentialKind},
    tenants::records::TenantUuid,
};
use uuid::Uuid;

use crate::cli::connect;

#[derive(Debug, Args)]
pub(crate) struct DeactivateCredentialArgs {
    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: String,

    #[arg(long)]
    tenant_uuid: Uuid,

    #[arg(long)]
    kind: CredentialKind,
}

pub(crate) async fn run(args: DeactivateCredentialArgs) -> Result<(), String> {
    let service = PgCredentialsService::new(connect(&args.database_url).await?);

    let credential = service
        .deactivate_credential(TenantUuid::from_uuid(args.tenant_uuid), args.kind)
        .await
        .map_err(|error| format!("failed to deactivate credential: {error}"))?;

    println!("deactivated {} for tenant {}", credential.kind, credential.tenant_uuid);

    Ok(())
}

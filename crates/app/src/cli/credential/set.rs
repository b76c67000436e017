use clap::Args;
use syncbridge_app::domain::{
    credentials::{
        CredentialsService, PgCredentialsService, Secret, data::NewCredential,
        records::CredentialKind,
    },
    tenants::records::TenantUuid,
};
use uuid::Uuid;

use crate::cli::connect;

#[derive(Debug, Args)]
pub(crate) struct SetCredentialArgs {
    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: String,

    /// Tenant that owns the credential
    #[arg(long)]
    tenant_uuid: Uuid,

    /// One of ecommerce-api-key, erp-app-key, erp-app-secret
    #[arg(long)]
    kind: CredentialKind,

    /// Secret value; read from the environment to keep it out of shell history
    #[arg(long, env = "CREDENTIAL_SECRET", hide_env_values = true)]
    secret: String,
}

pub(crate) async fn run(args: SetCredentialArgs) -> Result<(), String> {
    let secret = Secret::new(args.secret);

    if secret.is_blank() {
        return Err("secret cannot be empty".to_string());
    }

    let service = PgCredentialsService::new(connect(&args.database_url).await?);

    let stored = service
        .set_credential(
            TenantUuid::from_uuid(args.tenant_uuid),
            NewCredential {
                kind: args.kind,
                secret,
            },
        )
        .await
        .map_err(|error| format!("failed to store credential: {error}"))?;

    println!("credential_uuid: {}", stored.uuid);
    println!("tenant_uuid: {}", stored.tenant_uuid);
    println!("kind: {}", stored.kind);

    Ok(())
}

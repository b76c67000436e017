use clap::Args;
use jiff::Timestamp;
use syncbridge_app::domain::{
    audits::{JobAuditsService, PgJobAuditsService, data::AuditQuery},
    jobs::records::{JobStatus, JobUuid},
    tenants::records::TenantUuid,
};
use uuid::Uuid;

use crate::cli::connect;

#[derive(Debug, Args)]
pub(crate) struct ListAuditsArgs {
    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: String,

    #[arg(long)]
    tenant_uuid: Uuid,

    /// Only attempts of this job
    #[arg(long)]
    job_uuid: Option<Uuid>,

    /// Only attempts in this status, e.g. failed
    #[arg(long)]
    status: Option<JobStatus>,

    /// Only attempts started at or after this RFC 3339 timestamp
    #[arg(long)]
    since: Option<Timestamp>,

    #[arg(long, default_value_t = 50)]
    limit: u32,
}

pub(crate) async fn run(args: ListAuditsArgs) -> Result<(), String> {
    let service = PgJobAuditsService::new(connect(&args.database_url).await?);

    let audits = service
        .query(
            TenantUuid::from_uuid(args.tenant_uuid),
            AuditQuery {
                job: args.job_uuid.map(JobUuid::from_uuid),
                status: args.status,
                started_from: args.since,
                started_before: None,
                limit: args.limit,
            },
        )
        .await
        .map_err(|error| format!("failed to list audits: {error}"))?;

    if audits.is_empty() {
        println!("no attempts found for tenant {}", args.tenant_uuid);
        return Ok(());
    }

    for audit in audits {
        println!("job_uuid: {} (attempt {})", audit.job_uuid, audit.attempt);
        println!("job_type: {}", audit.job_type);
        println!("status: {}", audit.status);
        println!("started_at: {}", audit.started_at);
        println!(
            "duration_ms: {}",
            audit
                .duration_ms
                .map_or_else(|| "-".to_string(), |value| value.to_string())
        );
        if let Some(error) = audit.error {
            println!("error: {error}");
        }
        println!();
    }

    Ok(())
}

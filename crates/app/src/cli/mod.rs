use clap::{Parser, Subcommand};
use syncbridge_app::database::{self, Db};

mod audit;
mod credential;
mod cursor;
mod db;
mod sync;
mod tenant;

#[derive(Debug, Parser)]
#[command(name = "syncbridge-app", about = "Sync Bridge CLI", long_about = None)]
pub(crate) struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Tenant(tenant::TenantCommand),
    Credential(credential::CredentialCommand),
    Cursor(cursor::CursorCommand),
    Sync(sync::SyncCommand),
    Audit(audit::AuditCommand),
    Db(db::DbCommand),
}

impl Cli {
    pub(crate) async fn run(self) -> Result<(), String> {
        match self.command {
            Commands::Tenant(command) => tenant::run(command).await,
            Commands::Credential(command) => credential::run(command).await,
            Commands::Cursor(command) => cursor::run(command).await,
            Commands::Sync(command) => sync::run(command).await,
            Commands::Audit(command) => audit::run(command).await,
            Commands::Db(command) => db::run(command).await,
        }
    }
}

pub(crate) async fn connect(database_url: &str) -> Result<Db, String> {
    database::connect(database_url)
        .await
        .map(Db::new)
        .map_err(|error| format!("failed to connect to database: {error}"))
}

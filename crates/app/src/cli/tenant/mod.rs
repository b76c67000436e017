use clap::{Args, Subcommand};

mod create;
mod deactivate;

#[derive(Debug, Args)]
pub(crate) struct TenantCommand {
    #[command(subcommand)]
    command: TenantSubcommand,
}

#[derive(Debug, Subcommand)]
enum TenantSubcommand {
    Create(create::CreateTenantArgs),
    Deactivate(deactivate::DeactivateTenantArgs),
}

pub(crate) async fn run(command: TenantCommand) -> Result<(), String> {
    match command.command {
        TenantSubcommand::Create(args) => create::run(args).await,
        TenantSubcommand::Deactivate(args) => deactivate::run(args).await,
    }
}

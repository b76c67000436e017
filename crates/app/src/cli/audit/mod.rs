use clap::{Args, Subcommand};

mod list;

#[derive(Debug, Args)]
pub(crate) struct AuditCommand {
    #[command(subcommand)]
    command: AuditSubcommand,
}

#[derive(Debug, Subcommand)]
enum AuditSubcommand {
    List(list::ListAuditsArgs),
}

pub(crate) async fn run(command: AuditCommand) -> Result<(), String> {
    match command.command {
        AuditSubcommand::List(args) => list::run(args).await,
    }
}

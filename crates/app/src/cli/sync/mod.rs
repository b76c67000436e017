use clap::{Args, Subcommand};

mod trigger;

#[derive(Debug, Args)]
pub(crate) struct SyncCommand {
    #[command(subcommand)]
    command: SyncSubcommand,
}

#[derive(Debug, Subcommand)]
enum SyncSubcommand {
    Trigger(trigger::TriggerSyncArgs),
}

pub(crate) async fn run(command: SyncCommand) -> Result<(), String> {
    match command.command {
        SyncSubcommand::Trigger(args) => trigger::run(args).await,
    }
}

use clap::{Args, Subcommand};

mod deactivate;
mod set;

#[derive(Debug, Args)]
pub(crate) struct CredentialCommand {
    #[command(subcommand)]
    command: CredentialSubcommand,
}

#[derive(Debug, Subcommand)]
enum CredentialSubcommand {
    Set(set::SetCredentialArgs),
    Deactivate(deactivate::DeactivateCredentialArgs),
}

pub(crate) async fn run(command: CredentialCommand) -> Result<(), String> {
    match command.command {
        CredentialSubcommand::Set(args) => set::run(args).await,
        CredentialSubcommand::Deactivate(args) => deactivate::run(args).await,
    }
}

use clap::{Args, Subcommand};

mod list;
mod reset;

#[derive(Debug, Args)]
pub(crate) struct CursorCommand {
    #[command(subcommand)]
    command: CursorSubcommand,
}

#[derive(Debug, Subcommand)]
enum CursorSubcommand {
    List(list::ListCursorsArgs),
    Reset(reset::ResetCursorArgs),
}

pub(crate) async fn run(command: CursorCommand) -> Result<(), String> {
    match command.command {
        CursorSubcommand::List(args) => list::run(args).await,
        CursorSubcommand::Reset(args) => reset::run(args).await,
    }
}

use clap::{Args, Subcommand};

mod recalculate;

#[derive(Debug, Args)]
pub(crate) struct ReviewCommand {
    #[command(subcommand)]
    command: ReviewSubcommand,
}

#[derive(Debug, Subcommand)]
enum ReviewSubcommand {
    Recalculate(recalculate::RecalculateArgs),
}

pub(crate) async fn run(command: ReviewCommand) -> Result<(), String> {
    match command.command {
        ReviewSubcommand::Recalculate(args) => recalculate::run(args).await,
    }
}

use anyhow::Context;
use chargestop_cli::cli::{Cli, Commands};
use clap::Parser;
use tracing_subscriber::FmtSubscriber;

mod commands;
mod input;
mod report;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(cli.log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("setting default subscriber failed")?;

    match &cli.command {
        Commands::Solve(args) => commands::solve::handle(args),
        Commands::Inspect(args) => commands::inspect::handle(args),
    }
}

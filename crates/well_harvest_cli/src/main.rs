mod cli;
mod commands;
mod config;
mod logging;

use anyhow::Result;
use clap::Parser;
use tokio_util::sync::CancellationToken;

use crate::cli::{Cli, Command};
use crate::config::PipelineConfig;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::initialize(cli.log_to, &cli.log_file, logging::level_for(cli.verbose));

    let config = PipelineConfig::load(cli.config.as_deref())?;
    let cancel = CancellationToken::new();
    commands::cancel_on_interrupt(cancel.clone());

    match &cli.command {
        Command::Discover(args) => commands::discover(config, args, cancel).await,
        Command::Enrich(args) => commands::enrich(config, args, cancel).await,
        Command::Run(args) => commands::run(config, args, cancel).await,
        Command::ShowConfig => {
            println!("{}", config.to_ron()?);
            Ok(())
        }
    }
}

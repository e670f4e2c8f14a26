use anyhow::{Context, Result};
use clap::Parser;

use studystack_admin::cli::{Cli, Commands};
use studystack_admin::config::init_config;
use studystack_admin::runtime::modes;
use studystack_admin::system::init_logging;

#[actix_web::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = init_config(cli.config.as_deref()).context("Failed to load configuration")?;

    // Keep the guard alive so buffered log lines are flushed on exit
    let _log_guard = init_logging(&config.logging).context("Failed to initialize logging")?;

    match cli.command {
        None | Some(Commands::Serve) => modes::run_server().await,
        Some(command) => modes::run_cli(command).await,
    }
}

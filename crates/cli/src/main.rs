//! mcbe-news CLI entry point

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod app;
mod args;
mod commands;
mod config;

use args::{Cli, Commands};
use config::AppConfig;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = resolve_log_level(&cli);
    init_logging(&log_level)?;

    // Execute command
    match cli.command {
        Commands::Run(args) => commands::run::execute(args, cli.config).await,
        Commands::Chat(args) => commands::chat::execute(args, cli.config).await,
        Commands::Config(args) => commands::config::execute(args).await,
    }
}

/// `--log-level`, then `general.log_level` from the config, then "info".
/// Config load errors are reported later by the command itself.
fn resolve_log_level(cli: &Cli) -> String {
    if let Some(level) = &cli.log_level {
        return level.clone();
    }
    if matches!(cli.command, Commands::Config(_)) {
        return "info".to_string();
    }

    AppConfig::load(cli.config.as_deref())
        .map(|config| config.general.log_level)
        .unwrap_or_else(|_| "info".to_string())
}

fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(filter)
        .init();

    Ok(())
}

//! Lineage CLI
//!
//! Command-line interface for Lineage version graphs.

#![warn(clippy::all)]
#![forbid(unsafe_code)]

use anyhow::{Context as _, Result};
use clap::Parser;
use lineage_cli::cli::{Cli, Command};
use lineage_cli::commands::{self, Context};
use lineage_cli::config::LineageConfig;
use lineage_cli::config_handlers::handle_config_command;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = LineageConfig::load(cli.config.as_deref()).context("loading configuration")?;
    if let Some(dir) = cli.data_dir.clone() {
        config.data_dir = dir;
    }

    let level = cli.verbosity_filter().unwrap_or(config.log_level.as_str()).to_string();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| level.into()))
        .with_writer(std::io::stderr)
        .init();
    tracing::debug!(data_dir = %config.data_dir.display(), "lineage starting");

    let mut stdout = std::io::stdout().lock();
    match cli.command {
        Command::Config { action } => {
            handle_config_command(cli.config.as_deref(), action, &mut stdout)?
        }
        command => {
            let mut ctx = Context::open(&config, cli.project)?;
            commands::run(&mut ctx, command, &mut stdout)?;
        }
    }
    Ok(())
}

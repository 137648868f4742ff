//! Command-line entry point.
//!
//! # Responsibility
//! - Load configuration, start logging and open the store.
//! - Dispatch subcommands to core services and print JSON results.

mod commands;

use anyhow::{Context, Result};
use appointly_core::{init_logging, AppConfig};
use clap::Parser;
use commands::Cli;
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("event=cli_exit module=cli status=error error={err:#}");
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::from_env().context("failed to load configuration")?;

    if let Some(log_dir) = &config.log_dir {
        init_logging(&config.log_level, log_dir)
            .map_err(anyhow::Error::msg)
            .context("failed to start logging")?;
    }

    cli.execute(&config)
}

mod cli;
mod commands;

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;

use nod_core::config::{load_dotenv, Config};

use crate::cli::CliArgs;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = CliArgs::parse();

    // Initialize tracing
    let default_level = if args.verbose { "info" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    load_dotenv();
    let config = Config::from_env();
    config.log_summary();

    commands::run(args.command, &config).await
}

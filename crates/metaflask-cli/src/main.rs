//! Metaflask CLI
//!
//! Main entry point for the `metaflask` binary.

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use metaflask_common_config::Environment;
use metaflask_common_log::{LogConfig, LogLevel};
use tracing::{debug, error};

mod cli;
mod commands;
mod error;
mod output;

use cli::Cli;
use error::CliError;

fn main() -> ExitCode {
    let env = Environment::init();
    let cli = Cli::parse();

    if let Err(e) = init_logging(&cli) {
        eprintln!("warning: {e}");
    }
    debug!(profile = env.profile().unwrap_or("default"), "environment loaded");

    let runtime = match build_runtime() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("error: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(code = e.code(), "{e}");
            eprintln!("error: {e}");
            e.exit_code()
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let (config, base_dir) = cli.load_config()?;
    cli.execute(config, base_dir).await
}

fn build_runtime() -> anyhow::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to create async runtime")
}

/// Flags pick the level; `METAFLASK_LOG_*` still choose format and file.
fn init_logging(cli: &Cli) -> Result<(), CliError> {
    let mut config = LogConfig::from_env();
    if cli.verbose > 0 || cli.quiet || std::env::var_os("METAFLASK_LOG_LEVEL").is_none() {
        config.level = LogLevel::from_verbosity(cli.verbose, cli.quiet);
    }
    metaflask_common_log::init(config)?;
    Ok(())
}

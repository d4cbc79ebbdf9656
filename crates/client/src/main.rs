//! `fleet` binary entry point.
//!
//! Loads configuration, starts the local ledger runtime and runs a single
//! registry task.
//!
//! ```bash
//! fleet deploy
//! fleet mint-ship
//! fleet decrypt-attack
//! fleet launch-attack --defense 90
//! ```

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use client_bootstrap::{ClientConfig, RuntimeBuilder};
use console::style;
use fleet_client::{Cli, logging, tasks};

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file if it exists (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {err:#}", style("✗").red().bold());
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = ClientConfig::from_env()?;
    cli.apply(&mut config);

    let log_dir = config.file_logs.then(|| config.log_dir());
    let _guard = logging::setup_logging(log_dir.as_deref())?;

    tracing::debug!(network = %config.network, data_dir = %config.data_dir.display(), "starting fleet");

    let setup = RuntimeBuilder::new(config).build().await?;

    let mut stdout = std::io::stdout().lock();
    tasks::run_to_completion(setup, cli.address, &cli.command, &mut stdout).await
}

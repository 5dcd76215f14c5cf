//! Client entry point (spec.md §6): reads a query file, submits its lines
//! to the Aggregator in batched parallel rounds.

mod cli;
mod driver;

use anyhow::Result;
use clap::Parser;

use cli::Cli;

fn init_tracing() -> Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,patientdb_client=info".into());
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .try_init()
        .map_err(|err| anyhow::anyhow!(err.to_string()))?;
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing()?;
    driver::run(&cli)
}

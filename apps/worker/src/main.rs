//! Worker entry point (spec.md §4.6): bootstrap from the control FIFO,
//! register with the Aggregator's stats port, then serve queries until
//! shutdown.

mod bootstrap;
mod cli;
mod dispatch;
mod server;
mod signals;
mod stats_push;

use std::net::TcpListener;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use cli::Cli;

fn init_tracing() -> Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,patientdb_worker=info".into());
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

    let signals = signals::register()?;
    let (mut state, initial_stats) = bootstrap::bootstrap(&cli)?;

    let listener = TcpListener::bind(("0.0.0.0", 0)).context("failed to bind query listener")?;
    let port = listener.local_addr()?.port();
    state.stats.set_port(port);

    info!(worker_index = cli.worker_index, port, "query server listening");

    if let Err(err) = state.stats.push(&initial_stats) {
        warn!(%err, "failed to push initial stats registration to aggregator");
    }

    server::run(&listener, &mut state, &signals);
    Ok(())
}

//! Aggregator entry point (spec.md §4.5): two TCP listeners feeding a
//! bounded accept queue, drained by a fixed thread pool.

mod accept;
mod cli;
mod conn;
mod fanout;
mod pool;
mod queue;
mod registry;
mod stats_handler;

use std::net::TcpListener;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use signal_hook::consts::SIGINT;
use signal_hook::flag;
use tracing::info;

use cli::Cli;
use conn::ConnKind;
use queue::BoundedQueue;
use registry::WorkerRegistry;

fn init_tracing() -> Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,patientdb_aggregator=info".into());
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

    let query_listener = TcpListener::bind(("0.0.0.0", cli.query_port))
        .with_context(|| format!("failed to bind query port {}", cli.query_port))?;
    let stats_listener = TcpListener::bind(("0.0.0.0", cli.stats_port))
        .with_context(|| format!("failed to bind stats port {}", cli.stats_port))?;

    info!(query_port = cli.query_port, stats_port = cli.stats_port, "aggregator listening");

    let queue = Arc::new(BoundedQueue::new(cli.queue_capacity));
    let registry = Arc::new(WorkerRegistry::new());
    let print_lock = Arc::new(Mutex::new(()));
    let shutdown = Arc::new(AtomicBool::new(false));

    flag::register(SIGINT, Arc::clone(&shutdown)).context("failed to register SIGINT handler")?;

    let pool_handles = pool::spawn(
        cli.threads,
        Arc::clone(&queue),
        Arc::clone(&registry),
        Arc::clone(&shutdown),
        print_lock,
    );

    let query_acceptor = {
        let queue = Arc::clone(&queue);
        let shutdown = Arc::clone(&shutdown);
        thread::Builder::new()
            .name("agg-accept-query".into())
            .spawn(move || accept::run(query_listener, ConnKind::Query, queue, shutdown))
            .expect("failed to spawn query acceptor thread")
    };
    let stats_acceptor = {
        let queue = Arc::clone(&queue);
        let shutdown = Arc::clone(&shutdown);
        thread::Builder::new()
            .name("agg-accept-stats".into())
            .spawn(move || accept::run(stats_listener, ConnKind::Stats, queue, shutdown))
            .expect("failed to spawn stats acceptor thread")
    };

    while !shutdown.load(Ordering::SeqCst) {
        thread::sleep(Duration::from_millis(100));
    }
    info!("shutdown signal received, draining pool");

    queue.notify_all();
    let _ = query_acceptor.join();
    let _ = stats_acceptor.join();
    for handle in pool_handles {
        let _ = handle.join();
    }

    Ok(())
}

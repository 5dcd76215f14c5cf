//! Master supervisor entry point (spec.md §4.4): forks (spawns) one Worker
//! per slot, assigns countries round-robin over a per-worker named pipe,
//! and respawns a slot's Worker on `SIGCHLD` while reacting to `SIGINT`/
//! `SIGQUIT` by tearing the whole fleet down.

mod assign;
mod cli;
mod fifo;
mod signals;
mod spawn;

use std::net::SocketAddrV4;
use std::process::Child;

use anyhow::{Context, Result};
use clap::Parser;
use signal_hook::consts::{SIGCHLD, SIGINT, SIGQUIT};
use tracing::{error, info, warn};

use cli::Cli;

struct Slot {
    index: usize,
    fifo_path: std::path::PathBuf,
    child: Child,
    countries: Vec<String>,
}

fn init_tracing() -> Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,patientdb_master=info".into());
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

    let countries = assign::discover_countries(&cli.input_dir)?;
    if countries.is_empty() {
        anyhow::bail!("no country directories found under {:?}", cli.input_dir);
    }

    let workers = cli.workers.min(countries.len());
    if workers == 0 {
        anyhow::bail!("--workers must be at least 1");
    }

    let agg_addr = SocketAddrV4::new(cli.agg_ip, cli.agg_port);

    let mut slots: Vec<Slot> = Vec::with_capacity(workers);
    for index in 0..workers {
        let fifo_path = fifo::fifo_path(index);
        fifo::create(&fifo_path)?;

        let (child, mut pipe) = spawn::spawn_worker(index, &fifo_path, &cli.input_dir)?;
        let slot_countries = assign::countries_for_slot(&countries, workers, index);

        assign::send_countries(&mut pipe, &slot_countries)?;
        assign::send_aggregator_addr(&mut pipe, agg_addr)?;
        drop(pipe);

        info!(index, countries = ?slot_countries, "worker assigned");

        slots.push(Slot {
            index,
            fifo_path,
            child,
            countries: slot_countries,
        });
    }

    let mut signals = signals::register()?;

    for sig in signals.forever() {
        match sig {
            SIGCHLD => reap_and_respawn(&mut slots, &cli)?,
            SIGINT | SIGQUIT => {
                shutdown(&mut slots);
                if sig == SIGQUIT {
                    std::process::abort();
                }
                return Ok(());
            }
            _ => {}
        }
    }

    Ok(())
}

/// Poll every slot's child for exit; respawn any that have died into the
/// same slot, re-sending exactly that slot's country subset (spec.md
/// §4.4 Runtime, `SIGCHLD`). The Aggregator address is intentionally not
/// resent — see SPEC_FULL.md's Open Question resolution #2. The pipe's
/// write end is dropped as soon as the terminator frame is written, so
/// the respawned Worker's attempt to read an address frame observes a
/// clean EOF (and falls back to its persisted `.aggregator-addr`) instead
/// of blocking forever on a write end nobody will ever use again.
fn reap_and_respawn(slots: &mut [Slot], cli: &Cli) -> Result<()> {
    for slot in slots.iter_mut() {
        match slot.child.try_wait() {
            Ok(Some(status)) => {
                warn!(index = slot.index, ?status, "worker exited, respawning");

                fifo::unlink(&slot.fifo_path);
                fifo::create(&slot.fifo_path)?;

                let (child, mut pipe) =
                    spawn::spawn_worker(slot.index, &slot.fifo_path, &cli.input_dir)?;
                assign::send_countries(&mut pipe, &slot.countries)
                    .context("failed to re-send countries to respawned worker")?;
                drop(pipe);

                slot.child = child;
                info!(index = slot.index, countries = ?slot.countries, "worker respawned");
            }
            Ok(None) => {}
            Err(err) => error!(index = slot.index, %err, "failed to poll worker status"),
        }
    }
    Ok(())
}

/// `SIGINT`/`SIGQUIT` teardown: kill every child, close and unlink every
/// pipe, reap each child (spec.md §4.4 Runtime).
fn shutdown(slots: &mut [Slot]) {
    for slot in slots.iter() {
        let pid = slot.child.id() as libc::pid_t;
        unsafe {
            libc::kill(pid, libc::SIGKILL);
        }
    }
    for slot in slots.iter_mut() {
        let _ = slot.child.wait();
        fifo::unlink(&slot.fifo_path);
    }
}

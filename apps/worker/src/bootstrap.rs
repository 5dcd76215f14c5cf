//! Worker bootstrap (spec.md §4.4 step 4, §4.6): read the assigned-country
//! list and Aggregator address off the control FIFO, run the initial
//! ingestion pass for each country, and push the resulting stats.

use std::collections::HashMap;
use std::fs::{self, File};
use std::net::SocketAddrV4;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use patientdb_core::{discover_record_files, ingest_known_files, PatientIndex, RecordFile};
use patientdb_proto::{read_raw, read_string, FrameError, WireAddr};
use tracing::{info, warn};

use crate::stats_push::StatsPusher;

pub struct WorkerState {
    pub input_dir: PathBuf,
    pub assigned_countries: Vec<String>,
    pub index: PatientIndex,
    pub known_files: HashMap<String, Vec<RecordFile>>,
    pub stats: StatsPusher,
}

impl WorkerState {
    pub fn is_assigned(&self, country: &str) -> bool {
        self.assigned_countries
            .iter()
            .any(|c| c.eq_ignore_ascii_case(country))
    }

    /// Re-scan every assigned country for newly discovered files (spec.md
    /// §4.3 on-signal rescan) and push any resulting stats text.
    pub fn rescan(&mut self) {
        let mut combined = String::new();
        for country in &self.assigned_countries.clone() {
            let known = self.known_files.entry(country.clone()).or_default();
            discover_record_files(&self.input_dir, country, known);
            let stats = ingest_known_files(country, known, &mut self.index);
            combined.push_str(&stats);
        }
        if !combined.is_empty() {
            if let Err(err) = self.stats.push(&combined) {
                warn!(%err, "failed to push rescan stats to aggregator");
            }
        }
    }
}

fn addr_state_path(input_dir: &Path) -> PathBuf {
    input_dir.join(".aggregator-addr")
}

/// Read framed country names until the empty terminator, then attempt to
/// read one more raw frame for the Aggregator address. A respawned
/// Worker's Master does not resend the address (spec.md §4.4 Runtime), so
/// an `Eof` here is expected on respawn, not an error.
fn read_assignment(fifo_path: &Path) -> Result<(Vec<String>, Option<WireAddr>)> {
    let mut pipe =
        File::open(fifo_path).with_context(|| format!("failed to open fifo {fifo_path:?}"))?;

    let mut countries = Vec::new();
    loop {
        let line = read_string(&mut pipe).context("failed to read assigned-country frame")?;
        if line.is_empty() {
            break;
        }
        countries.push(line);
    }

    let addr = match read_raw(&mut pipe) {
        Ok(bytes) => WireAddr::from_bytes(&bytes),
        Err(FrameError::Eof) => None,
        Err(err) => return Err(err).context("failed to read aggregator address frame"),
    };

    Ok((countries, addr))
}

fn resolve_aggregator_addr(input_dir: &Path, from_fifo: Option<WireAddr>) -> Result<SocketAddrV4> {
    let state_path = addr_state_path(input_dir);

    if let Some(wire) = from_fifo {
        fs::write(&state_path, wire.to_bytes())
            .with_context(|| format!("failed to persist aggregator address to {state_path:?}"))?;
        return Ok(wire.into());
    }

    let bytes = fs::read(&state_path).with_context(|| {
        format!(
            "worker was respawned without an address frame and no persisted \
             address was found at {state_path:?}"
        )
    })?;
    let wire = WireAddr::from_bytes(&bytes)
        .ok_or_else(|| anyhow::anyhow!("persisted aggregator address at {state_path:?} is corrupt"))?;
    Ok(wire.into())
}

pub fn bootstrap(cli: &crate::cli::Cli) -> Result<(WorkerState, String)> {
    let (countries, wire_addr) = read_assignment(&cli.fifo)?;
    let agg_addr = resolve_aggregator_addr(&cli.input_dir, wire_addr)?;

    info!(worker_index = cli.worker_index, ?countries, %agg_addr, "worker bootstrapped");

    let mut index = PatientIndex::new();
    let mut known_files = HashMap::new();
    let mut initial_stats = String::new();

    for country in &countries {
        let known = known_files.entry(country.clone()).or_insert_with(Vec::new);
        discover_record_files(&cli.input_dir, country, known);
        let stats = ingest_known_files(country, known, &mut index);
        initial_stats.push_str(&stats);
    }

    Ok((
        WorkerState {
            input_dir: cli.input_dir.clone(),
            assigned_countries: countries,
            index,
            known_files,
            stats: StatsPusher::new(agg_addr),
        },
        initial_stats,
    ))
}

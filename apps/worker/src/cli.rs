use std::path::PathBuf;

use clap::Parser;

/// Bootstrap args a spawned Worker needs (SPEC_FULL.md §apps/worker): not
/// the Master's own `-w/-b/-s/-p/-i` flags, which belong to `apps/master`.
#[derive(Parser, Debug, Clone)]
#[command(name = "patientdb-worker", version, about = "patientdb Worker")]
pub struct Cli {
    /// Path to this worker's control FIFO, written by the Master.
    #[arg(long)]
    pub fifo: PathBuf,

    /// This worker's slot index (`i` in `i mod W`), used only for logging.
    #[arg(long = "worker-index")]
    pub worker_index: usize,

    /// Root directory containing one subdirectory per country.
    #[arg(long = "input-dir")]
    pub input_dir: PathBuf,
}

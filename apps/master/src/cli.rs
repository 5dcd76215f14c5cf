use std::net::Ipv4Addr;
use std::path::PathBuf;

use clap::Parser;

/// Master supervisor CLI (spec.md §6): `-w/-b/-s/-p/-i`, all required.
#[derive(Parser, Debug, Clone)]
#[command(name = "patientdb-master", version, about = "patientdb Master supervisor")]
pub struct Cli {
    /// Number of Worker processes to maintain.
    #[arg(short = 'w', long = "workers")]
    pub workers: usize,

    /// Pipe I/O chunk size, in bytes, used when relaying framed messages
    /// over the per-worker control FIFOs (the patientdb-proto framed codec
    /// already chunks reads/writes internally; this flag is accepted and
    /// recorded for parity with the original CLI surface rather than
    /// overriding that shared constant).
    #[arg(short = 'b', long = "fifo-buffer")]
    pub fifo_buffer: usize,

    /// Aggregator IP address that every Worker registers stats against.
    #[arg(short = 's', long = "agg-ip")]
    pub agg_ip: Ipv4Addr,

    /// Aggregator stats-port that every Worker registers against.
    #[arg(short = 'p', long = "agg-port")]
    pub agg_port: u16,

    /// Root directory containing one subdirectory per country.
    #[arg(short = 'i', long = "input-dir")]
    pub input_dir: PathBuf,
}

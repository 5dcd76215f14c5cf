use std::net::Ipv4Addr;
use std::path::PathBuf;

use clap::Parser;

/// Client CLI (spec.md §6): `-q/-w/-sip/-sp`. The source's `getopt`-style
/// single-dash multi-character flags (`-sip`, `-sp`) are expressed as
/// clap long flags (`--sip`, `--sp`) — clap's short flags are single-char
/// only, so `-q`/`-w` map directly but `-sip`/`-sp` cannot.
#[derive(Parser, Debug, Clone)]
#[command(name = "patientdb-client", version, about = "patientdb query-file driver")]
pub struct Cli {
    /// Query file, one query line per row.
    #[arg(short = 'q', long = "query-file")]
    pub query_file: PathBuf,

    /// Threads per batch (also the batch size).
    #[arg(short = 'w', long = "threads")]
    pub threads: usize,

    /// Aggregator IP address.
    #[arg(long = "sip")]
    pub agg_ip: Ipv4Addr,

    /// Aggregator query port.
    #[arg(long = "sp")]
    pub agg_port: u16,
}

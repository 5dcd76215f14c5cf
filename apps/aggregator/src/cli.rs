use clap::Parser;

/// Aggregator CLI (spec.md §6): `-q/-s/-w/-b`.
#[derive(Parser, Debug, Clone)]
#[command(name = "patientdb-aggregator", version, about = "patientdb Aggregator server")]
pub struct Cli {
    /// TCP port Clients connect to.
    #[arg(short = 'q', long = "query-port")]
    pub query_port: u16,

    /// TCP port Workers register stats against.
    #[arg(short = 's', long = "stats-port")]
    pub stats_port: u16,

    /// Fixed thread-pool size.
    #[arg(short = 'w', long = "threads")]
    pub threads: usize,

    /// Bounded accept-queue capacity.
    #[arg(short = 'b', long = "queue-capacity")]
    pub queue_capacity: usize,
}

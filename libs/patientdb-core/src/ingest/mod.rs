//! Record-file ingestion: directory discovery, per-line parsing and
//! per-file statistics, assembled the way a Worker runs its initial scan
//! and any later `SIGUSR1`-triggered rescan (spec.md §4).

mod parse;
mod pipeline;
mod stats;
mod types;

pub use parse::{ingest_line, IngestLineError};
pub use pipeline::{discover_record_files, ingest_known_files};
pub use stats::generate_stats;
pub use types::{RecordFile, RecordFileError};

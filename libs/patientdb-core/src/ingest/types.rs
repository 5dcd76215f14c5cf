//! Per-country known-file bookkeeping (spec.md §4): the filesystem layout
//! is `<input_dir>/<country>/<date>`, one file per admission/exit batch,
//! named by the calendar date it covers.

use std::path::PathBuf;

use patientdb_proto::Date;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecordFileError {
    #[error("record file name {0:?} is not a valid date")]
    BadFileName(PathBuf),
}

/// A file discovered under a country's directory, tracked across rescans
/// so a `SIGUSR1`-triggered rescan only parses files it hasn't seen yet.
#[derive(Debug, Clone)]
pub struct RecordFile {
    pub path: PathBuf,
    pub date: Date,
    pub parsed: bool,
}

impl RecordFile {
    pub fn new(path: PathBuf) -> Result<Self, RecordFileError> {
        let date = file_date(&path)?;
        Ok(RecordFile {
            path,
            date,
            parsed: false,
        })
    }
}

fn file_date(path: &std::path::Path) -> Result<Date, RecordFileError> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| RecordFileError::BadFileName(path.to_path_buf()))?;
    name.parse()
        .map_err(|_| RecordFileError::BadFileName(path.to_path_buf()))
}

//! Worker process lifecycle: spawn, open the write end of its control
//! FIFO, and tear down (spec.md §4.4 step 3, §5 "fully isolated process,
//! no shared memory").
//!
//! Rust's standard library has no safe `fork`; forking a process that may
//! already hold a `tracing` subscriber or background threads is exactly
//! the footgun `std::process::Command` exists to avoid. Spawning the
//! sibling `patientdb-worker` binary gives the same "isolated process,
//! one-way pipe" topology spec.md §5 requires without touching raw
//! `libc::fork`.

use std::env;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{Child, Command};

use anyhow::{Context, Result};

use crate::fifo;

/// Locate the `patientdb-worker` binary alongside the currently running
/// `patientdb-master` binary (both land in the same `target/{profile}`
/// directory under a cargo workspace build).
fn worker_binary_path() -> Result<PathBuf> {
    let exe = env::current_exe().context("failed to resolve current executable path")?;
    let dir = exe
        .parent()
        .ok_or_else(|| anyhow::anyhow!("executable path {exe:?} has no parent directory"))?;

    let candidate = dir.join(if cfg!(windows) {
        "patientdb-worker.exe"
    } else {
        "patientdb-worker"
    });
    Ok(candidate)
}

/// Spawn worker slot `index`, then open the write end of its FIFO. The
/// write-end open blocks (via [`fifo::open_write_end`]'s retry loop) until
/// the freshly spawned child has opened its read end, matching spec.md
/// §4.4 step 3's stated ordering.
pub fn spawn_worker(index: usize, fifo_path: &Path, input_dir: &Path) -> Result<(Child, File)> {
    let worker_bin = worker_binary_path()?;

    let child = Command::new(&worker_bin)
        .arg("--fifo")
        .arg(fifo_path)
        .arg("--worker-index")
        .arg(index.to_string())
        .arg("--input-dir")
        .arg(input_dir)
        .spawn()
        .with_context(|| format!("failed to spawn worker {index} ({worker_bin:?})"))?;

    let pipe = fifo::open_write_end(fifo_path)
        .with_context(|| format!("failed to open write end of {fifo_path:?}"))?;

    Ok((child, pipe))
}

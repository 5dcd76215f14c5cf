//! Synchronous signal delivery for the Master's single-threaded run loop
//! (spec.md §4.4 Runtime, §5 "parent blocks on signals"): `signals.forever()`
//! stands in for the source's `pause()`.

use anyhow::{Context, Result};
use signal_hook::consts::{SIGCHLD, SIGINT, SIGQUIT};
use signal_hook::iterator::Signals;

pub fn register() -> Result<Signals> {
    Signals::new([SIGINT, SIGQUIT, SIGCHLD]).context("failed to register master signal handlers")
}

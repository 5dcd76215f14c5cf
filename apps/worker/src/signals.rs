//! Signal flags for the Worker's accept loop (spec.md §4.6, §5): `SIGUSR1`
//! triggers a rescan, `SIGINT`/`SIGQUIT` request shutdown (abort on
//! `SIGQUIT`). A blocking `accept()` cannot reliably be interrupted by a
//! flag alone under Rust's std (EINTR-retrying socket calls), so the
//! server loop polls these atomics on a short non-blocking accept cadence
//! instead — see `server.rs`.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use anyhow::{Context, Result};
use signal_hook::consts::{SIGINT, SIGQUIT, SIGUSR1};
use signal_hook::flag;

pub struct SignalFlags {
    pub rescan: Arc<AtomicBool>,
    pub sigint: Arc<AtomicBool>,
    pub sigquit: Arc<AtomicBool>,
}

pub fn register() -> Result<SignalFlags> {
    let rescan = Arc::new(AtomicBool::new(false));
    let sigint = Arc::new(AtomicBool::new(false));
    let sigquit = Arc::new(AtomicBool::new(false));

    flag::register(SIGUSR1, Arc::clone(&rescan)).context("failed to register SIGUSR1 handler")?;
    flag::register(SIGINT, Arc::clone(&sigint)).context("failed to register SIGINT handler")?;
    flag::register(SIGQUIT, Arc::clone(&sigquit)).context("failed to register SIGQUIT handler")?;

    Ok(SignalFlags {
        rescan,
        sigint,
        sigquit,
    })
}

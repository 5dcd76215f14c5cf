//! Query-server accept loop (spec.md §4.6): one framed request per
//! connection, dispatched straight to `PatientIndex`, replied with one
//! framed message, closed.

use std::net::{TcpListener, TcpStream};
use std::sync::atomic::Ordering;
use std::time::Duration;

use patientdb_proto::{read_string, write_string};
use tracing::{debug, warn};

use crate::bootstrap::WorkerState;
use crate::dispatch;
use crate::signals::SignalFlags;

/// Poll interval between non-blocking `accept` attempts: frequent enough
/// that `SIGUSR1`/`SIGINT`/`SIGQUIT` are honored promptly, coarse enough
/// not to spin the CPU.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

pub fn run(listener: &TcpListener, state: &mut WorkerState, signals: &SignalFlags) {
    listener
        .set_nonblocking(true)
        .expect("failed to set query listener non-blocking");

    loop {
        if signals.sigquit.swap(false, Ordering::SeqCst) {
            std::process::abort();
        }
        if signals.sigint.swap(false, Ordering::SeqCst) {
            return;
        }
        if signals.rescan.swap(false, Ordering::SeqCst) {
            state.rescan();
        }

        match listener.accept() {
            Ok((stream, peer)) => {
                debug!(%peer, "accepted query connection");
                if let Err(err) = handle_connection(stream, state) {
                    warn!(%peer, %err, "query connection failed");
                }
            }
            Err(err) if err.kind() == std::io::ErrorKind::WouldBlock => {
                std::thread::sleep(POLL_INTERVAL);
            }
            Err(err) => {
                warn!(%err, "accept failed");
                std::thread::sleep(POLL_INTERVAL);
            }
        }
    }
}

fn handle_connection(mut stream: TcpStream, state: &WorkerState) -> anyhow::Result<()> {
    let line = read_string(&mut stream)?;
    let reply = match patientdb_proto::parse_query(&line) {
        Ok(query) => dispatch::handle(&query, state),
        Err(err) => err.to_string(),
    };
    write_string(&mut stream, &reply)?;
    Ok(())
}

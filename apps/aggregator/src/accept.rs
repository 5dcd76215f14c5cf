//! Accept loops feeding the bounded queue (spec.md §4.5): the source uses
//! a single `select` across both listeners; std has no portable
//! multi-listener `select` without extra dependencies, so each listener
//! gets its own blocking-with-short-poll acceptor thread instead, both
//! producers into the same [`BoundedQueue`] — the same "accept, wrap as
//! `Conn`, push" contract, just two producer threads instead of one.

use std::net::TcpListener;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use patientdb_proto::write_string;
use tracing::{debug, warn};

use crate::conn::{Conn, ConnKind};
use crate::queue::BoundedQueue;

const POLL_INTERVAL: Duration = Duration::from_millis(50);
const QUEUE_FULL_MSG: &str = "Circular buffer full. Closing connection...\n";

pub fn run(listener: TcpListener, kind: ConnKind, queue: Arc<BoundedQueue>, shutdown: Arc<AtomicBool>) {
    listener
        .set_nonblocking(true)
        .expect("failed to set listener non-blocking");

    loop {
        if shutdown.load(Ordering::SeqCst) {
            return;
        }

        match listener.accept() {
            Ok((stream, peer)) => {
                debug!(%peer, ?kind, "accepted connection");
                let conn = Conn { kind, stream, peer };
                if let Err(mut conn) = queue.try_push(conn) {
                    let _ = write_string(&mut conn.stream, QUEUE_FULL_MSG);
                    let _ = write_string(&mut conn.stream, "");
                    warn!(%conn.peer, "accept queue full, connection rejected");
                }
            }
            Err(err) if err.kind() == std::io::ErrorKind::WouldBlock => {
                std::thread::sleep(POLL_INTERVAL);
            }
            Err(err) => {
                warn!(%err, ?kind, "accept failed");
                std::thread::sleep(POLL_INTERVAL);
            }
        }
    }
}

//! STATS connection handling (spec.md §4.5): read framed messages until
//! an empty terminator; a `"PORT:<n>"` message registers the peer's
//! listening port, everything else is only logged.

use std::net::{IpAddr, SocketAddr, SocketAddrV4, TcpStream};
use std::sync::Mutex;

use patientdb_proto::read_string;
use tracing::info;

use crate::registry::WorkerRegistry;

const PORT_PREFIX: &str = "PORT:";

pub fn handle(mut stream: TcpStream, peer: SocketAddr, registry: &WorkerRegistry, print_lock: &Mutex<()>) {
    loop {
        let msg = match read_string(&mut stream) {
            Ok(msg) => msg,
            Err(_) => return,
        };
        if msg.is_empty() {
            return;
        }

        if let Some(port_str) = msg.strip_prefix(PORT_PREFIX) {
            if let (Ok(port), IpAddr::V4(ip)) = (port_str.trim().parse::<u16>(), peer.ip()) {
                registry.register(SocketAddrV4::new(ip, port));
                let _guard = print_lock.lock().expect("print lock poisoned");
                info!(%peer, port, "worker registered");
            }
            continue;
        }

        // Serialized under `print_lock` so stats blocks from different
        // workers are never interleaved mid-line (spec.md §4.5).
        let _guard = print_lock.lock().expect("print lock poisoned");
        info!(%peer, stats = %msg, "worker stats");
    }
}

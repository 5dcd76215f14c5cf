//! Query fanout (spec.md §4.5): parse the client's query line, then open a
//! fresh connection to every registered Worker, relay the line, and
//! either sum (`diseaseFrequency`) or stream back (everything else) each
//! worker's single framed reply.

use std::net::{SocketAddr, SocketAddrV4, TcpStream};
use std::time::Duration;

use patientdb_proto::{parse_query, read_string, write_string, CommandKind, ProtocolError};
use tracing::debug;

use crate::registry::WorkerRegistry;

/// Bound on how long the Aggregator waits to connect to one Worker during
/// fanout. Not specified by spec.md (§5 notes the source has no timeouts
/// at all), but named there as a reasonable addition "to prevent fanout
/// stalls" against a Worker that died without yet being respawned.
const WORKER_CONNECT_TIMEOUT: Duration = Duration::from_millis(500);

pub fn handle(mut client: TcpStream, registry: &WorkerRegistry) {
    let line = match read_string(&mut client) {
        Ok(line) => line,
        Err(_) => return,
    };

    let query = match parse_query(&line) {
        Ok(query) => query,
        Err(err) => {
            reply_error(&mut client, &err);
            return;
        }
    };

    let workers = registry.snapshot();

    if query.kind == CommandKind::DiseaseFrequency {
        fanout_disease_frequency(&mut client, &line, &workers);
    } else {
        fanout_stream(&mut client, &line, &workers);
    }

    let _ = write_string(&mut client, "");
}

fn reply_error(client: &mut TcpStream, err: &ProtocolError) {
    let _ = write_string(client, &err.to_string());
    let _ = write_string(client, "");
}

/// One framed request/reply against a single Worker. `ECONNREFUSED` (and
/// any other connect failure — the Worker may not have been respawned
/// yet) is treated as "silently skip", matching spec.md §4.5.
fn query_worker(addr: SocketAddrV4, line: &str) -> Option<String> {
    let sock_addr = SocketAddr::V4(addr);
    let mut stream = TcpStream::connect_timeout(&sock_addr, WORKER_CONNECT_TIMEOUT).ok()?;
    write_string(&mut stream, line).ok()?;
    read_string(&mut stream).ok()
}

fn fanout_disease_frequency(client: &mut TcpStream, line: &str, workers: &[SocketAddrV4]) {
    let mut sum: i64 = 0;

    for &addr in workers {
        let Some(reply) = query_worker(addr, line) else {
            debug!(%addr, "worker unreachable during fanout, skipping");
            continue;
        };
        match reply.trim().parse::<i64>() {
            Ok(-1) => continue,
            Ok(value) => sum += value,
            Err(_) => continue,
        }
    }

    let _ = write_string(client, &sum.to_string());
}

fn fanout_stream(client: &mut TcpStream, line: &str, workers: &[SocketAddrV4]) {
    for &addr in workers {
        let Some(reply) = query_worker(addr, line) else {
            debug!(%addr, "worker unreachable during fanout, skipping");
            continue;
        };
        if reply.is_empty() {
            continue;
        }
        if write_string(client, &reply).is_err() {
            return;
        }
    }
}

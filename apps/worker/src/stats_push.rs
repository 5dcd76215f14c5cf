//! Push side of the STATS protocol (spec.md §4.5): a Worker opens a fresh
//! connection per push, declares its listening port with a `"PORT:<n>"`
//! frame, optionally follows with the stats text, then an empty
//! terminator frame before closing — matching the Aggregator's
//! stats_handler, which reads framed messages "until an empty terminator"
//! and closes the connection once it sees one.

use std::net::{SocketAddrV4, TcpStream};

use anyhow::{Context, Result};
use patientdb_proto::write_string;

pub struct StatsPusher {
    addr: SocketAddrV4,
    port: u16,
}

impl StatsPusher {
    pub fn new(addr: SocketAddrV4) -> Self {
        StatsPusher { addr, port: 0 }
    }

    /// Record the Worker's own query-server port once the listener is
    /// bound, so every subsequent push can re-declare it.
    pub fn set_port(&mut self, port: u16) {
        self.port = port;
    }

    /// Push `body` (may be empty — an empty push still (re)registers the
    /// port) as a one-shot STATS connection.
    pub fn push(&self, body: &str) -> Result<()> {
        let mut stream = TcpStream::connect(self.addr)
            .with_context(|| format!("failed to connect to aggregator stats port {}", self.addr))?;

        write_string(&mut stream, &format!("PORT:{}", self.port))
            .context("failed to write PORT registration frame")?;
        if !body.is_empty() {
            write_string(&mut stream, body).context("failed to write stats body frame")?;
        }
        write_string(&mut stream, "").context("failed to write stats terminator frame")?;
        Ok(())
    }
}

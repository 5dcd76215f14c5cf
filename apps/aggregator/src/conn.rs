//! Accepted connections, tagged by which listener produced them (spec.md
//! §3 "Connection").

use std::net::{SocketAddr, TcpStream};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnKind {
    Query,
    Stats,
}

pub struct Conn {
    pub kind: ConnKind,
    pub stream: TcpStream,
    pub peer: SocketAddr,
}

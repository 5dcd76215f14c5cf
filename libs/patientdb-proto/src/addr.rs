//! Fixed-size address record the Master hands each Worker over its named
//! pipe (spec.md §5.3): the Aggregator's IPv4 address and stats-port,
//! serialized as a flat byte record rather than a string so it can ride
//! [`crate::frame::write_raw`]/[`read_raw`] unambiguously.

use std::net::{Ipv4Addr, SocketAddrV4};

const RECORD_LEN: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WireAddr {
    pub ip: Ipv4Addr,
    pub port: u16,
}

impl WireAddr {
    pub fn to_bytes(self) -> [u8; RECORD_LEN] {
        let mut out = [0u8; RECORD_LEN];
        out[..4].copy_from_slice(&self.ip.octets());
        out[4..].copy_from_slice(&self.port.to_ne_bytes());
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != RECORD_LEN {
            return None;
        }
        let ip = Ipv4Addr::new(bytes[0], bytes[1], bytes[2], bytes[3]);
        let port = u16::from_ne_bytes([bytes[4], bytes[5]]);
        Some(WireAddr { ip, port })
    }
}

impl From<SocketAddrV4> for WireAddr {
    fn from(addr: SocketAddrV4) -> Self {
        WireAddr {
            ip: *addr.ip(),
            port: addr.port(),
        }
    }
}

impl From<WireAddr> for SocketAddrV4 {
    fn from(addr: WireAddr) -> Self {
        SocketAddrV4::new(addr.ip, addr.port)
    }
}

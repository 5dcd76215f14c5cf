//! `WorkerRegistry`: ordered sequence of registered Worker addresses
//! (spec.md §3, §4.5). Populated only by stats handlers, read only by
//! query handlers. Never pruned — a dead Worker's address is skipped at
//! fanout time (`ECONNREFUSED`), not removed, matching spec.md's explicit
//! description.
//!
//! Guarded by `std::sync::RwLock` rather than left lock-free: spec.md §5
//! flags the source's lock-free access to this structure as a bug the
//! original only gets away with because registrations always precede
//! useful queries in practice, and explicitly mandates a read/write lock
//! for a correct reimplementation.

use std::net::SocketAddrV4;
use std::sync::RwLock;

#[derive(Default)]
pub struct WorkerRegistry {
    addrs: RwLock<Vec<SocketAddrV4>>,
}

impl WorkerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, addr: SocketAddrV4) {
        self.addrs.write().expect("registry lock poisoned").push(addr);
    }

    /// A point-in-time copy of every registered address, safe to iterate
    /// without holding the lock across the (possibly slow) network calls
    /// a fanout makes.
    pub fn snapshot(&self) -> Vec<SocketAddrV4> {
        self.addrs.read().expect("registry lock poisoned").clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn register_appends_and_never_dedups() {
        let registry = WorkerRegistry::new();
        let a = SocketAddrV4::new(Ipv4Addr::LOCALHOST, 9000);
        registry.register(a);
        registry.register(a);
        assert_eq!(registry.snapshot(), vec![a, a]);
    }
}

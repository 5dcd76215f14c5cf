//! Bounded circular accept-queue feeding the fixed thread pool (spec.md
//! §4.5, §5): a single mutex guards `(buffer, available_count)`, paired
//! with a condvar the pool threads wait on.
//!
//! `VecDeque` is already a ring buffer internally; using it via
//! `push_back`/`pop_front` plus a capacity check gets the exact circular-
//! buffer *contract* spec.md describes (FIFO order, reject-when-full)
//! without hand-rolling an index-juggled array — "keep HOW, replace WHAT"
//! applied to the container itself.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex};

use crate::conn::Conn;

pub struct BoundedQueue {
    inner: Mutex<VecDeque<Conn>>,
    capacity: usize,
    cv_avail: Condvar,
}

impl BoundedQueue {
    pub fn new(capacity: usize) -> Self {
        BoundedQueue {
            inner: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
            cv_avail: Condvar::new(),
        }
    }

    /// Attempt to enqueue `conn`. Returns `false` (and drops nothing —
    /// the caller still owns `conn`) when the queue is already at
    /// capacity, so the accept loop can reply "Circular buffer full" and
    /// close it instead.
    pub fn try_push(&self, conn: Conn) -> Result<(), Conn> {
        let mut buf = self.inner.lock().expect("queue mutex poisoned");
        if buf.len() >= self.capacity {
            return Err(conn);
        }
        buf.push_back(conn);
        self.cv_avail.notify_one();
        Ok(())
    }

    /// Block until a connection is available or `shutdown` becomes true,
    /// re-checking `shutdown` each time the condvar wakes (spec.md §4.5's
    /// pool-thread loop).
    pub fn pop_blocking(&self, shutdown: &std::sync::atomic::AtomicBool) -> Option<Conn> {
        use std::sync::atomic::Ordering;

        let mut buf = self.inner.lock().expect("queue mutex poisoned");
        loop {
            if let Some(conn) = buf.pop_front() {
                return Some(conn);
            }
            if shutdown.load(Ordering::SeqCst) {
                return None;
            }
            let (guard, _timeout) = self
                .cv_avail
                .wait_timeout(buf, std::time::Duration::from_millis(200))
                .expect("queue condvar poisoned");
            buf = guard;
        }
    }

    /// Wake every waiting pool thread so they can observe `shutdown`.
    pub fn notify_all(&self) {
        self.cv_avail.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{TcpListener, TcpStream};
    use std::sync::atomic::AtomicBool;

    fn dummy_conn() -> Conn {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let client = TcpStream::connect(addr).unwrap();
        let (stream, peer) = listener.accept().unwrap();
        drop(client);
        Conn {
            kind: crate::conn::ConnKind::Query,
            stream,
            peer,
        }
    }

    #[test]
    fn rejects_push_past_capacity() {
        let q = BoundedQueue::new(1);
        assert!(q.try_push(dummy_conn()).is_ok());
        assert!(q.try_push(dummy_conn()).is_err());
    }

    #[test]
    fn pop_returns_in_fifo_order() {
        let q = BoundedQueue::new(2);
        q.try_push(dummy_conn()).unwrap();
        q.try_push(dummy_conn()).unwrap();
        let shutdown = AtomicBool::new(false);
        assert!(q.pop_blocking(&shutdown).is_some());
        assert!(q.pop_blocking(&shutdown).is_some());
    }

    #[test]
    fn pop_unblocks_on_shutdown() {
        let q = BoundedQueue::new(1);
        let shutdown = AtomicBool::new(true);
        assert!(q.pop_blocking(&shutdown).is_none());
    }
}

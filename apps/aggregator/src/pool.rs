//! Fixed thread pool draining the bounded accept queue (spec.md §4.5,
//! §5): each thread loops popping a connection, dispatching it by kind,
//! and closing it — no per-connection thread spawn, no async runtime.

use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use crate::conn::ConnKind;
use crate::fanout;
use crate::queue::BoundedQueue;
use crate::registry::WorkerRegistry;
use crate::stats_handler;

pub fn spawn(
    nthreads: usize,
    queue: Arc<BoundedQueue>,
    registry: Arc<WorkerRegistry>,
    shutdown: Arc<AtomicBool>,
    print_lock: Arc<Mutex<()>>,
) -> Vec<JoinHandle<()>> {
    (0..nthreads)
        .map(|id| {
            let queue = Arc::clone(&queue);
            let registry = Arc::clone(&registry);
            let shutdown = Arc::clone(&shutdown);
            let print_lock = Arc::clone(&print_lock);

            thread::Builder::new()
                .name(format!("agg-pool-{id}"))
                .spawn(move || worker_loop(&queue, &registry, &shutdown, &print_lock))
                .expect("failed to spawn pool thread")
        })
        .collect()
}

fn worker_loop(
    queue: &BoundedQueue,
    registry: &WorkerRegistry,
    shutdown: &AtomicBool,
    print_lock: &Mutex<()>,
) {
    while let Some(conn) = queue.pop_blocking(shutdown) {
        match conn.kind {
            ConnKind::Query => fanout::handle(conn.stream, registry),
            ConnKind::Stats => stats_handler::handle(conn.stream, conn.peer, registry, print_lock),
        }
    }
}

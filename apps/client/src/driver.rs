//! Batched parallel query driver (spec.md §6): each batch of up to
//! `threads` query-file lines is dispatched concurrently, every thread
//! gated on a shared start-barrier so the batch fires as one wave, then
//! joined before the next batch begins.

use std::io::BufRead;
use std::net::{SocketAddrV4, TcpStream};
use std::sync::{Arc, Condvar, Mutex};

use anyhow::{Context, Result};
use patientdb_proto::{read_string, write_string, FrameError};
use tracing::{info, warn};

use crate::cli::Cli;

pub fn run(cli: &Cli) -> Result<()> {
    let file = std::fs::File::open(&cli.query_file)
        .with_context(|| format!("failed to open query file {:?}", cli.query_file))?;
    let lines: Vec<String> = std::io::BufReader::new(file)
        .lines()
        .collect::<std::io::Result<_>>()
        .context("failed to read query file")?;
    let lines: Vec<String> = lines.into_iter().filter(|l| !l.trim().is_empty()).collect();

    let agg_addr = SocketAddrV4::new(cli.agg_ip, cli.agg_port);
    let print_lock = Arc::new(Mutex::new(()));

    for (batch_idx, batch) in lines.chunks(cli.threads.max(1)).enumerate() {
        run_batch(batch_idx, batch, agg_addr, &print_lock);
    }

    Ok(())
}

fn run_batch(batch_idx: usize, batch: &[String], agg_addr: SocketAddrV4, print_lock: &Arc<Mutex<()>>) {
    let barrier = Arc::new((Mutex::new(false), Condvar::new()));

    let handles: Vec<_> = batch
        .iter()
        .cloned()
        .map(|line| {
            let barrier = Arc::clone(&barrier);
            let print_lock = Arc::clone(print_lock);
            std::thread::spawn(move || {
                wait_for_start(&barrier);
                run_query(&line, agg_addr, &print_lock);
            })
        })
        .collect();

    {
        let (lock, cvar) = &*barrier;
        let mut started = lock.lock().expect("start-barrier mutex poisoned");
        *started = true;
        cvar.notify_all();
    }
    info!(batch_idx, queries = batch.len(), "batch started");

    for handle in handles {
        let _ = handle.join();
    }
}

fn wait_for_start(barrier: &(Mutex<bool>, Condvar)) {
    let (lock, cvar) = barrier;
    let mut started = lock.lock().expect("start-barrier mutex poisoned");
    while !*started {
        started = cvar.wait(started).expect("start-barrier condvar poisoned");
    }
}

fn run_query(line: &str, agg_addr: SocketAddrV4, print_lock: &Mutex<()>) {
    let mut stream = match TcpStream::connect(agg_addr) {
        Ok(s) => s,
        Err(err) => {
            warn!(%err, query = line, "failed to connect to aggregator");
            return;
        }
    };

    if write_string(&mut stream, line).is_err() {
        warn!(query = line, "failed to send query to aggregator");
        return;
    }

    let mut replies = Vec::new();
    loop {
        match read_string(&mut stream) {
            Ok(reply) if reply.is_empty() => break,
            Ok(reply) => replies.push(reply),
            Err(FrameError::Eof) => break,
            Err(err) => {
                warn!(%err, query = line, "failed to read reply");
                break;
            }
        }
    }

    let _guard = print_lock.lock().expect("print lock poisoned");
    println!("> {line}");
    for reply in &replies {
        print!("{reply}");
    }
    println!();
}

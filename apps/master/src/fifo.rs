//! Named-pipe plumbing for the Master↔Worker control channel (spec.md
//! §4.4): one simplex FIFO per Worker, created with `mkfifo` and opened for
//! writing with a non-blocking retry loop so the Master never deadlocks
//! waiting for a child that hasn't opened its read end yet.
//!
//! Grounded on `core-server-rs/src/services/analysis/local_qdrant.rs`'s
//! `unsafe { libc:: }` block style — the only raw-libc call site in the
//! teacher corpus, generalized here from `getrlimit`/`setrlimit` to
//! `mkfifo`/`open`.

use std::ffi::CString;
use std::fs::File;
use std::io;
use std::os::unix::io::FromRawFd;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};

/// Default pipe mode, `0775`, per spec.md §4.4 step 2.
const FIFO_MODE: libc::mode_t = 0o775;

pub fn fifo_path(index: usize) -> PathBuf {
    PathBuf::from(format!("wfifo_{index}"))
}

/// Create `wfifo_<index>`, tolerating a pre-existing pipe left behind by a
/// previous run (spec.md §4.4 step 2).
pub fn create(path: &Path) -> Result<()> {
    let c_path = CString::new(path.as_os_str().as_encoded_bytes())
        .with_context(|| format!("fifo path {path:?} contains a NUL byte"))?;

    let rc = unsafe { libc::mkfifo(c_path.as_ptr(), FIFO_MODE) };
    if rc != 0 {
        let err = io::Error::last_os_error();
        if err.kind() != io::ErrorKind::AlreadyExists {
            return Err(err).with_context(|| format!("mkfifo {path:?} failed"));
        }
    }
    Ok(())
}

pub fn unlink(path: &Path) {
    let _ = std::fs::remove_file(path);
}

/// Open `path`'s write end, retrying with `O_NONBLOCK` until a reader
/// (the spawned Worker) has opened the other end. A blocking `open(2)` on
/// a FIFO's write side blocks until a reader exists; opening non-blocking
/// instead returns `ENXIO` in that window, which this loop treats as
/// "not ready yet" and retries rather than propagating as an error.
pub fn open_write_end(path: &Path) -> Result<File> {
    let c_path = CString::new(path.as_os_str().as_encoded_bytes())
        .with_context(|| format!("fifo path {path:?} contains a NUL byte"))?;

    loop {
        let fd = unsafe { libc::open(c_path.as_ptr(), libc::O_WRONLY | libc::O_NONBLOCK) };
        if fd >= 0 {
            // Switch back to blocking semantics for the actual frame I/O:
            // the retry dance only needs to happen at `open` time.
            let flags = unsafe { libc::fcntl(fd, libc::F_GETFL, 0) };
            unsafe { libc::fcntl(fd, libc::F_SETFL, flags & !libc::O_NONBLOCK) };
            return Ok(unsafe { File::from_raw_fd(fd) });
        }

        let err = io::Error::last_os_error();
        if err.raw_os_error() != Some(libc::ENXIO) {
            return Err(err).with_context(|| format!("open {path:?} for writing failed"));
        }
        thread::sleep(Duration::from_millis(20));
    }
}

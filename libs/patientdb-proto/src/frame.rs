//! Length-prefixed framing for every pipe and socket link in the system
//! (spec.md §4.7): a fixed-width `u64` header holding the body length in
//! bytes, followed by the body. Mirrors the header-then-body segment layout
//! `node-forwarder::spool` uses for its on-disk records, generalized from a
//! fixed struct to an arbitrary-length envelope.
//!
//! Two message shapes ride this envelope: a NUL-terminated UTF-8 string
//! (the sole format on the wire) and a raw byte blob (pipes only, used to
//! carry the Aggregator's address as a fixed-size record). An empty string
//! is a legal frame and is used as an end-of-sequence terminator by several
//! protocols (country list, stats push, query reply stream).

use std::io::{self, Read, Write};

use thiserror::Error;

const HEADER_LEN: usize = std::mem::size_of::<u64>();
/// Chunk size used to relay partial reads/writes, matching the buffer-sized
/// copy loop `fifo.c`'s `_read_fifo`/`_write_fifo` use over a pipe.
const CHUNK_LEN: usize = 4096;

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("no more messages")]
    Eof,
    #[error("partial read: expected {expected} bytes, got {got}")]
    PartialRead { expected: usize, got: usize },
    #[error("frame body is not valid UTF-8")]
    InvalidUtf8,
    #[error("frame body is missing its NUL terminator")]
    MissingTerminator,
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Write a string message: body is `msg` followed by a NUL terminator.
/// An empty `msg` is legal and is used as a protocol terminator.
pub fn write_string<W: Write>(w: &mut W, msg: &str) -> Result<(), FrameError> {
    let mut body = Vec::with_capacity(msg.len() + 1);
    body.extend_from_slice(msg.as_bytes());
    body.push(0);
    write_body(w, &body)
}

/// Read a string message written by [`write_string`]. Returns
/// `Err(FrameError::Eof)` when the peer closed before a header could be
/// read (the fifo/socket analogue of EOF-before-the-first-frame).
pub fn read_string<R: Read>(r: &mut R) -> Result<String, FrameError> {
    let body = read_body(r)?;
    let without_nul = body
        .strip_suffix(&[0])
        .ok_or(FrameError::MissingTerminator)?;
    String::from_utf8(without_nul.to_vec()).map_err(|_| FrameError::InvalidUtf8)
}

/// Write a raw, opaque-bytes message (pipes only).
pub fn write_raw<W: Write>(w: &mut W, bytes: &[u8]) -> Result<(), FrameError> {
    write_body(w, bytes)
}

/// Read a raw message written by [`write_raw`].
pub fn read_raw<R: Read>(r: &mut R) -> Result<Vec<u8>, FrameError> {
    read_body(r)
}

fn write_body<W: Write>(w: &mut W, body: &[u8]) -> Result<(), FrameError> {
    let header = (body.len() as u64).to_ne_bytes();
    write_all_chunked(w, &header)?;
    write_all_chunked(w, body)?;
    Ok(())
}

fn read_body<R: Read>(r: &mut R) -> Result<Vec<u8>, FrameError> {
    let mut header = [0u8; HEADER_LEN];
    read_exact_or_eof(r, &mut header)?;
    let len = u64::from_ne_bytes(header) as usize;

    let mut body = vec![0u8; len];
    if len > 0 {
        read_all_chunked(r, &mut body)?;
    }
    Ok(body)
}

fn write_all_chunked<W: Write>(w: &mut W, mut buf: &[u8]) -> Result<(), FrameError> {
    while !buf.is_empty() {
        let take = buf.len().min(CHUNK_LEN);
        w.write_all(&buf[..take])?;
        buf = &buf[take..];
    }
    Ok(())
}

fn read_all_chunked<R: Read>(r: &mut R, buf: &mut [u8]) -> Result<(), FrameError> {
    let mut filled = 0;
    while filled < buf.len() {
        let want = (buf.len() - filled).min(CHUNK_LEN);
        let n = r.read(&mut buf[filled..filled + want])?;
        if n == 0 {
            return Err(FrameError::PartialRead {
                expected: buf.len(),
                got: filled,
            });
        }
        filled += n;
    }
    Ok(())
}

/// Like `read_all_chunked`, but a zero-length read on the very first byte
/// of the header is reported as a clean EOF rather than a partial read —
/// this is how a fresh connection close (no frames ever sent) is told
/// apart from a connection that died mid-frame.
fn read_exact_or_eof<R: Read>(r: &mut R, buf: &mut [u8]) -> Result<(), FrameError> {
    let n = r.read(buf)?;
    if n == 0 {
        return Err(FrameError::Eof);
    }
    if n < buf.len() {
        read_all_chunked(r, &mut buf[n..])?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn round_trips_a_string_message() {
        let mut buf = Vec::new();
        write_string(&mut buf, "hello").unwrap();
        let mut cur = Cursor::new(buf);
        assert_eq!(read_string(&mut cur).unwrap(), "hello");
    }

    #[test]
    fn empty_string_round_trips_as_terminator() {
        let mut buf = Vec::new();
        write_string(&mut buf, "").unwrap();
        let mut cur = Cursor::new(buf);
        assert_eq!(read_string(&mut cur).unwrap(), "");
    }

    #[test]
    fn sequence_of_messages_reads_back_in_order() {
        let mut buf = Vec::new();
        write_string(&mut buf, "first").unwrap();
        write_string(&mut buf, "second").unwrap();
        write_string(&mut buf, "").unwrap();

        let mut cur = Cursor::new(buf);
        assert_eq!(read_string(&mut cur).unwrap(), "first");
        assert_eq!(read_string(&mut cur).unwrap(), "second");
        assert_eq!(read_string(&mut cur).unwrap(), "");
    }

    #[test]
    fn reading_past_the_end_is_eof() {
        let mut cur = Cursor::new(Vec::<u8>::new());
        assert!(matches!(read_string(&mut cur), Err(FrameError::Eof)));
    }

    #[test]
    fn raw_message_round_trips_arbitrary_bytes() {
        let mut buf = Vec::new();
        write_raw(&mut buf, &[1, 2, 3, 4, 5]).unwrap();
        let mut cur = Cursor::new(buf);
        assert_eq!(read_raw(&mut cur).unwrap(), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn large_message_survives_small_chunking() {
        let payload = "x".repeat(CHUNK_LEN * 3 + 17);
        let mut buf = Vec::new();
        write_string(&mut buf, &payload).unwrap();
        let mut cur = Cursor::new(buf);
        assert_eq!(read_string(&mut cur).unwrap(), payload);
    }
}

//! Source/sink adapters: wrap a `Read` or `Write` and rewrite the stream as
//! it passes through. These own the only blocking calls in the crate; the
//! engine itself never touches I/O.
//!
//! Byte chunks do not respect UTF-8 scalar boundaries, so both adapters keep
//! the undecodable tail of each chunk (at most 3 bytes) and prepend it to
//! the next one. Invalid UTF-8 surfaces as `InvalidData`.

use std::io::{self, Read, Write};

use crate::engine::Rewriter;
use crate::error::WeirError;

fn engine_error(e: WeirError) -> io::Error {
    io::Error::other(e.to_string())
}

/// Split `pending` into its longest valid UTF-8 prefix and feed it to the
/// engine, keeping an incomplete trailing sequence for the next chunk.
fn feed_valid(rw: &mut Rewriter, pending: &mut Vec<u8>) -> io::Result<()> {
    let valid = match std::str::from_utf8(pending) {
        Ok(s) => {
            rw.feed(s);
            pending.clear();
            return Ok(());
        }
        Err(e) if e.error_len().is_some() => {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "stream is not valid UTF-8",
            ));
        }
        Err(e) => e.valid_up_to(),
    };
    let (head, _) = pending.split_at(valid);
    rw.feed(std::str::from_utf8(head).expect("valid_up_to prefix is valid UTF-8"));
    pending.drain(..valid);
    Ok(())
}

fn truncated_tail_error() -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidData,
        "stream ends inside a UTF-8 sequence",
    )
}

/// Pull-style adapter: a `Read` whose contents are the rewritten inner
/// stream.
pub struct RewriteReader<R> {
    inner: R,
    rw: Rewriter,
    pending: Vec<u8>,
    out: Vec<u8>,
    out_pos: usize,
    chunk: Vec<u8>,
    done: bool,
}

const READ_CHUNK: usize = 8 * 1024;

impl<R: Read> RewriteReader<R> {
    pub fn new(inner: R, rw: Rewriter) -> Self {
        RewriteReader {
            inner,
            rw,
            pending: Vec::new(),
            out: Vec::new(),
            out_pos: 0,
            chunk: vec![0; READ_CHUNK],
            done: false,
        }
    }

    /// One refill cycle: read, feed, step until blocked, drain.
    fn refill(&mut self) -> io::Result<()> {
        let n = self.inner.read(&mut self.chunk)?;
        if n == 0 {
            if !self.pending.is_empty() {
                return Err(truncated_tail_error());
            }
            self.rw.end_of_stream();
            self.done = self.rw.pump().map_err(engine_error)?;
            debug_assert!(self.done, "end of stream always reaches Done");
        } else {
            self.pending.extend_from_slice(&self.chunk[..n]);
            feed_valid(&mut self.rw, &mut self.pending)?;
            let _ = self.rw.pump().map_err(engine_error)?;
        }
        let drained = self.rw.drain_finalized();
        self.out.clear();
        self.out_pos = 0;
        self.out.extend_from_slice(drained.as_bytes());
        Ok(())
    }
}

impl<R: Read> Read for RewriteReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        loop {
            if self.out_pos < self.out.len() {
                let n = (self.out.len() - self.out_pos).min(buf.len());
                buf[..n].copy_from_slice(&self.out[self.out_pos..self.out_pos + n]);
                self.out_pos += n;
                return Ok(n);
            }
            if self.done {
                return Ok(0);
            }
            self.refill()?;
        }
    }
}

/// Push-style adapter: a `Write` that rewrites what is written through it.
/// Call [`RewriteWriter::finish`] to flush the held-back tail — dropping
/// without it truncates the output at the last safe boundary.
pub struct RewriteWriter<W: Write> {
    inner: W,
    rw: Rewriter,
    pending: Vec<u8>,
}

impl<W: Write> RewriteWriter<W> {
    pub fn new(inner: W, rw: Rewriter) -> Self {
        RewriteWriter {
            inner,
            rw,
            pending: Vec::new(),
        }
    }

    /// Signal end of stream, resolve every deferred decision, write the
    /// remaining output, and return the inner writer.
    pub fn finish(mut self) -> io::Result<W> {
        if !self.pending.is_empty() {
            return Err(truncated_tail_error());
        }
        self.rw.end_of_stream();
        let done = self.rw.pump().map_err(engine_error)?;
        debug_assert!(done, "end of stream always reaches Done");
        let tail = self.rw.drain_finalized();
        self.inner.write_all(tail.as_bytes())?;
        self.inner.flush()?;
        Ok(self.inner)
    }
}

impl<W: Write> Write for RewriteWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.pending.extend_from_slice(buf);
        feed_valid(&mut self.rw, &mut self.pending)?;
        let _ = self.rw.pump().map_err(engine_error)?;
        let out = self.rw.drain_finalized();
        self.inner.write_all(out.as_bytes())?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Rewriter;

    #[test]
    fn reader_rewrites_a_stream() {
        let rw = Rewriter::new("edit stream", "modify stream").unwrap();
        let mut reader = RewriteReader::new("edit stream".as_bytes(), rw);
        let mut out = String::new();
        reader.read_to_string(&mut out).unwrap();
        assert_eq!(out, "modify stream");
    }

    /// One-byte reads from the inner source: every refill is a boundary.
    struct OneByte<R>(R);
    impl<R: Read> Read for OneByte<R> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = 1.min(buf.len());
            self.0.read(&mut buf[..n])
        }
    }

    #[test]
    fn reader_survives_single_byte_chunks() {
        let rw = Rewriter::new("cat", "dog").unwrap();
        let mut reader = RewriteReader::new(OneByte("a cat sat".as_bytes()), rw);
        let mut out = String::new();
        reader.read_to_string(&mut out).unwrap();
        assert_eq!(out, "a dog sat");
    }

    #[test]
    fn reader_reassembles_split_scalars() {
        let rw = Rewriter::new("ß", "ss").unwrap();
        let mut reader = RewriteReader::new(OneByte("straße".as_bytes()), rw);
        let mut out = String::new();
        reader.read_to_string(&mut out).unwrap();
        assert_eq!(out, "strasse");
    }

    #[test]
    fn reader_rejects_invalid_utf8() {
        let rw = Rewriter::new("x", "y").unwrap();
        let mut reader = RewriteReader::new(&[0x61, 0xFF, 0x62][..], rw);
        let mut out = Vec::new();
        let err = reader.read_to_end(&mut out).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn reader_rejects_truncated_tail() {
        let rw = Rewriter::new("x", "y").unwrap();
        // First two bytes of a four-byte scalar, then EOF.
        let mut reader = RewriteReader::new(&[0xF0, 0x9F][..], rw);
        let mut out = Vec::new();
        let err = reader.read_to_end(&mut out).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn writer_rewrites_what_flows_through() {
        let rw = Rewriter::new(r"\d+", "#").unwrap();
        let mut writer = RewriteWriter::new(Vec::new(), rw);
        for chunk in ["ab 12", "34 cd ", "5 e"] {
            writer.write_all(chunk.as_bytes()).unwrap();
        }
        let out = writer.finish().unwrap();
        assert_eq!(out, b"ab # cd # e");
    }

    #[test]
    fn writer_holds_back_undecided_tail_until_finish() {
        let rw = Rewriter::new("cat", "dog").unwrap();
        let mut writer = RewriteWriter::new(Vec::new(), rw);
        writer.write_all(b"a ca").unwrap();
        // "ca" could still become "cat": not yet emitted.
        assert!(writer.inner.len() < 4);
        let out = writer.finish().unwrap();
        assert_eq!(out, b"a ca");
    }
}

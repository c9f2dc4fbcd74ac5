//! Byte-oriented stream traits and an in-memory implementation.
//!
//! The core only ever talks to `Readable`/`Writable`; it never touches a file
//! descriptor. An embedder (a CLI, a test) is responsible for filling a
//! [`ByteStream`] from wherever the bytes actually live.

use crate::error::{Error, Result};

/// A byte-oriented, single-pass readable stream with one level of pushback.
pub trait Readable {
    /// Reads exactly `buf.len()` bytes, or fails with a malformed-input error.
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<()>;

    /// Reads a single byte.
    fn read_u8(&mut self) -> Result<u8> {
        let mut byte = [0u8; 1];
        self.read_exact(&mut byte)?;
        Ok(byte[0])
    }

    /// Un-reads the single byte most recently returned by `read_u8`/`read_exact`.
    /// Only one level of pushback is guaranteed; the parser never needs more.
    fn push_back(&mut self);

    /// Looks at the next byte without consuming it, or `None` at end of stream.
    fn peek(&mut self) -> Result<Option<u8>> {
        if self.is_eof() {
            return Ok(None);
        }
        let byte = self.read_u8()?;
        self.push_back();
        Ok(Some(byte))
    }

    /// Reads a line, including its trailing `\n` if present, up to `max_len`
    /// bytes. Returns `Ok(None)` only at a clean end of stream with nothing
    /// left to read.
    fn read_line(&mut self, max_len: usize) -> Result<Option<String>>;

    /// Bytes remaining before end of stream.
    fn remaining(&self) -> usize;

    fn is_eof(&self) -> bool {
        self.remaining() == 0
    }
}

/// A byte-oriented, single-pass writable stream.
pub trait Writable {
    fn write_bytes(&mut self, data: &[u8]) -> Result<()>;

    /// Writes a short text fragment. Not length-bounded in this
    /// implementation: unlike the original C `stream_printf`'s fixed 1 KiB
    /// stack buffer, a Rust `String` has no such ceiling.
    fn write_text(&mut self, text: &str) -> Result<()> {
        self.write_bytes(text.as_bytes())
    }

    /// Current logical length of the stream.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A growable, seekable in-memory byte buffer implementing both stream
/// traits. Backed by a plain `Vec<u8>`, whose geometric-growth reallocation
/// strategy gives the amortized-linear-cost property the spec asks for
/// without needing to hand-roll it.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ByteStream {
    buf: Vec<u8>,
    pos: usize,
}

impl ByteStream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_vec(buf: Vec<u8>) -> Self {
        Self { buf, pos: 0 }
    }

    /// Rewinds the read/write cursor to the start, to re-read a stream this
    /// process just finished writing.
    pub fn rewind(&mut self) {
        self.pos = 0;
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }
}

impl Readable for ByteStream {
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        let end = self
            .pos
            .checked_add(buf.len())
            .ok_or_else(|| Error::malformed("stream position overflow"))?;
        if end > self.buf.len() {
            return Err(Error::malformed("unexpected end of stream"));
        }
        buf.copy_from_slice(&self.buf[self.pos..end]);
        self.pos = end;
        Ok(())
    }

    fn push_back(&mut self) {
        if self.pos > 0 {
            self.pos -= 1;
        }
    }

    fn read_line(&mut self, max_len: usize) -> Result<Option<String>> {
        if self.is_eof() {
            return Ok(None);
        }

        let mut raw = Vec::new();
        while raw.len() < max_len {
            let byte = self.read_u8()?;
            raw.push(byte);
            if byte == b'\n' || self.is_eof() {
                break;
            }
        }
        Ok(Some(String::from_utf8_lossy(&raw).into_owned()))
    }

    fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }
}

impl Writable for ByteStream {
    fn write_bytes(&mut self, data: &[u8]) -> Result<()> {
        let end = self.pos + data.len();
        if end > self.buf.len() {
            self.buf.resize(end, 0);
        }
        self.buf[self.pos..end].copy_from_slice(data);
        self.pos = end;
        Ok(())
    }

    fn len(&self) -> usize {
        self.buf.len()
    }
}

//! OpenPGP CRC-24, as used by both the per-line and whole-stream checksums in
//! the base-16 artifact, and by the trailing checksum in raw mode.
//!
//! Delegates to the `crc24` crate — the same dependency the teacher carries
//! for this exact OpenPGP variant (init `0xB704CE`, poly `0x864CFB`) — rather
//! than re-deriving the bit-shifting fold by hand. The crate computes the
//! checksum in one pass over a full byte slice, so [`Accumulator`] buffers
//! whatever region is being checksummed (one data line, or the whole stream)
//! and calls it once, at `finalize`.

/// RFC 4880 CRC-24 initial value.
pub const INIT: u32 = 0x00B7_04CE;

/// Buffers a logical CRC-24 region (one base-16 data line, or an entire
/// payload) and computes its checksum once, via the `crc24` crate.
#[derive(Debug, Default, Clone)]
pub struct Accumulator(Vec<u8>);

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds more bytes into this region.
    pub fn update(&mut self, data: &[u8]) {
        self.0.extend_from_slice(data);
    }

    /// Computes the CRC-24 of every byte folded in so far.
    pub fn finalize(&self) -> u32 {
        crc24::crc24(&self.0)
    }
}

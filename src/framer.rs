//! The base-16 and raw paper-key framings: encode on the extract side,
//! decode on the restore side.
//!
//! Grounded on `original_source/.../output.c`'s `print_base16`,
//! `output_start`, `output_bytes`, and `output_finish` — generalized into a
//! small tagged-state writer (per the "no global state" design note) instead
//! of the original's static line-CRC variable and `output_type` global.

use chrono::Utc;

use crate::crc24::Accumulator;
use crate::error::{CrcLine, Error, Result};
use crate::fingerprint::Fingerprint;
use crate::policy::{Framing, DEFAULT_OUTPUT_WIDTH, MIN_OUTPUT_WIDTH};
use crate::stream::{Readable, Writable};

const FORMAT_DESCRIPTION: &str = concat!(
    "# This is a paper backup of the secret parts of an OpenPGP key. It does\n",
    "# not contain signatures, user IDs, or any public key material: combine\n",
    "# it with the matching public key to restore a usable secret key.\n",
    "#\n",
    "# Format: a version octet (0), then for each key in turn a key-version\n",
    "# octet, a 20-byte SHA-1 fingerprint, a 2-byte big-endian length, and\n",
    "# that many bytes of secret key material, encoded below as hex octets\n",
    "# with a per-line and a final whole-stream CRC-24 checksum.\n",
);

/// Mutable state for an in-progress base-16 write. Threaded explicitly
/// instead of living as the original tool's static `crc` variable.
#[derive(Debug)]
struct Base16State {
    line_items: usize,
    line_number: u32,
    col: usize,
    line_open: bool,
    line_crc: Accumulator,
    total_crc: Accumulator,
}

impl Base16State {
    fn new(output_width: usize) -> Result<Self> {
        if output_width < MIN_OUTPUT_WIDTH {
            return Err(Error::malformed(format!(
                "output width {output_width} is below the minimum of {MIN_OUTPUT_WIDTH}"
            )));
        }
        let line_items = (output_width - 5 - 6) / 3;
        Ok(Base16State {
            line_items,
            line_number: 1,
            col: 0,
            line_open: false,
            line_crc: Accumulator::new(),
            total_crc: Accumulator::new(),
        })
    }
}

/// Writes a paper-key artifact: the comment header (base-16 only) followed
/// by the payload written through [`write_bytes`](Writer::write_bytes), and
/// terminated by [`finish`](Writer::finish).
pub enum Writer {
    Raw { crc: Accumulator },
    Base16(Base16State),
}

impl Writer {
    /// Begins a new artifact. `framing` must be [`Framing::Raw`] or
    /// [`Framing::Base16`] (`Auto` is restore-only).
    pub fn begin(
        output: &mut impl Writable,
        framing: Framing,
        primary_fingerprint: &Fingerprint,
        output_width: usize,
    ) -> Result<Self> {
        match framing {
            Framing::Raw => Ok(Writer::Raw {
                crc: Accumulator::new(),
            }),
            Framing::Base16 => {
                write_comment_header(output, primary_fingerprint)?;
                Ok(Writer::Base16(Base16State::new(output_width)?))
            }
            Framing::Auto => Err(Error::malformed("Auto framing is restore-only")),
        }
    }

    pub fn write_bytes(&mut self, output: &mut impl Writable, data: &[u8]) -> Result<()> {
        match self {
            Writer::Raw { crc } => {
                crc.update(data);
                output.write_bytes(data)
            }
            Writer::Base16(state) => {
                for &byte in data {
                    write_base16_byte(output, state, byte)?;
                }
                Ok(())
            }
        }
    }

    pub fn finish(self, output: &mut impl Writable) -> Result<()> {
        match self {
            Writer::Raw { crc } => {
                let crc = crc.finalize();
                output.write_bytes(&crc.to_be_bytes()[1..])
            }
            Writer::Base16(mut state) => finish_base16(output, &mut state),
        }
    }
}

fn write_base16_byte(output: &mut impl Writable, state: &mut Base16State, byte: u8) -> Result<()> {
    if !state.line_open {
        output.write_text(&format!("{:03}: ", state.line_number))?;
        state.line_open = true;
        state.line_crc = Accumulator::new();
    }

    output.write_text(&format!("{} ", hex::encode_upper([byte])))?;
    state.line_crc.update(&[byte]);
    state.total_crc.update(&[byte]);
    state.col += 1;

    if state.col == state.line_items {
        flush_line(output, state)?;
    }
    Ok(())
}

fn flush_line(output: &mut impl Writable, state: &mut Base16State) -> Result<()> {
    output.write_text(&format!("{:06X}\n", state.line_crc.finalize()))?;
    state.line_number += 1;
    state.col = 0;
    state.line_open = false;
    Ok(())
}

fn finish_base16(output: &mut impl Writable, state: &mut Base16State) -> Result<()> {
    if state.line_open {
        flush_line(output, state)?;
    }
    output.write_text(&format!(
        "{:03}: {:06X}\n",
        state.line_number,
        state.total_crc.finalize()
    ))
}

fn write_comment_header(output: &mut impl Writable, fingerprint: &Fingerprint) -> Result<()> {
    output.write_text(&format!("# Key fingerprint: {fingerprint}\n"))?;
    output.write_text(&format!(
        "# Generated: {}\n",
        Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    ))?;
    output.write_text(&format!("# paperkey {}\n", env!("CARGO_PKG_VERSION")))?;
    output.write_text(FORMAT_DESCRIPTION)?;
    output.write_text("\n")
}

/// Decodes a base-16 artifact (§4.8) into its binary payload.
pub fn decode_base16(input: &mut impl Readable) -> Result<Vec<u8>> {
    let mut payload = Vec::new();
    let mut total_crc = Accumulator::new();

    loop {
        let line = input
            .read_line(1 << 20)?
            .ok_or_else(|| Error::malformed("base-16 input ended before the terminator line"))?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let Some(colon) = trimmed.find(':') else {
            return Err(Error::malformed("base-16 data line is missing ':'"));
        };
        let rest = trimmed[colon + 1..].trim();
        let tokens: Vec<&str> = rest.split_whitespace().collect();
        let Some((crc_token, octet_tokens)) = tokens.split_last() else {
            return Err(Error::malformed("base-16 data line has no tokens"));
        };

        if crc_token.len() != 6 || !crc_token.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(Error::malformed("base-16 CRC token must be 6 hex digits"));
        }
        let declared_crc =
            u32::from_str_radix(crc_token, 16).map_err(|_| Error::malformed("bad CRC token"))?;

        if octet_tokens.is_empty() {
            // Terminator line: declared CRC must match the whole-stream accumulator.
            if declared_crc != total_crc.finalize() {
                return Err(Error::CrcMismatch {
                    line: CrcLine::Final,
                });
            }
            return Ok(payload);
        }

        let line_number: u32 = trimmed[..colon]
            .trim()
            .parse()
            .map_err(|_| Error::malformed("base-16 line number is not an integer"))?;

        let mut line_crc = Accumulator::new();
        let mut line_bytes = Vec::with_capacity(octet_tokens.len());
        for tok in octet_tokens {
            if tok.len() != 2 {
                return Err(Error::malformed("base-16 octet must be 2 hex digits"));
            }
            let decoded =
                hex::decode(tok).map_err(|_| Error::malformed("base-16 octet must be 2 hex digits"))?;
            let byte = decoded[0];
            line_bytes.push(byte);
            line_crc.update(&[byte]);
        }

        if declared_crc != line_crc.finalize() {
            return Err(Error::CrcMismatch {
                line: CrcLine::Line(line_number),
            });
        }

        total_crc.update(&line_bytes);
        payload.extend_from_slice(&line_bytes);
    }
}

/// Decodes a raw artifact: splits off and verifies the trailing 3-byte
/// CRC-24, returning the payload that precedes it.
pub fn decode_raw(input: &mut impl Readable) -> Result<Vec<u8>> {
    let remaining = input.remaining();
    if remaining < 3 {
        return Err(Error::malformed("raw input is shorter than a CRC-24"));
    }
    let mut all = vec![0u8; remaining];
    input.read_exact(&mut all)?;

    let (payload, trailer) = all.split_at(all.len() - 3);
    let declared = ((trailer[0] as u32) << 16) | ((trailer[1] as u32) << 8) | trailer[2] as u32;
    let mut acc = Accumulator::new();
    acc.update(payload);
    let computed = acc.finalize();
    if declared != computed {
        return Err(Error::CrcMismatch {
            line: CrcLine::Final,
        });
    }
    Ok(payload.to_vec())
}

/// Sniffs the framing of a restore input for [`Framing::Auto`]: peeks the
/// next byte and treats `#` or an ASCII hex digit as base-16, anything else
/// as raw. The stream's single-level pushback only supports peeking one
/// byte, so — per the design note leaving this heuristic to the embedder —
/// this assumes the artifact has no leading whitespace before its first
/// meaningful byte, which holds for every artifact this crate itself emits.
pub fn sniff_framing(input: &mut impl Readable) -> Result<Framing> {
    match input.peek()? {
        Some(b) if b == b'#' || b.is_ascii_hexdigit() => Ok(Framing::Base16),
        Some(_) => Ok(Framing::Raw),
        None => Ok(Framing::Raw),
    }
}

pub fn default_output_width() -> usize {
    DEFAULT_OUTPUT_WIDTH
}

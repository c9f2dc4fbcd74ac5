//! OpenPGP packet framing: old- and new-format header parsing, tag-filtered
//! scanning, and header emission.
//!
//! Ported from `original_source/.../packet.c` (`parse_packet`) for the
//! reader side and `output.c`'s `output_openpgp_header` for the writer side,
//! cast into the `Readable`/`Writable` port traits instead of raw file
//! descriptors.

use crate::error::{Error, Result};
use crate::stream::{Readable, Writable};

/// Secret-Key Packet.
pub const TAG_SECRET_KEY: u8 = 5;
/// Public-Key Packet.
pub const TAG_PUBLIC_KEY: u8 = 6;
/// Secret-Subkey Packet.
pub const TAG_SECRET_SUBKEY: u8 = 7;
/// Public-Subkey Packet.
pub const TAG_PUBLIC_SUBKEY: u8 = 14;

/// One parsed OpenPGP packet: its tag, its body, and the exact header+body
/// bytes that produced it. The raw bytes are kept so restore's pass-through
/// copying can re-emit packets it doesn't touch byte-for-byte, framing
/// included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPacket {
    pub tag: u8,
    pub body: Vec<u8>,
    pub raw: Vec<u8>,
}

/// Parses exactly one packet (any tag) from `input`, or `None` at a clean
/// end of stream.
pub fn read_next(input: &mut impl Readable) -> Result<Option<RawPacket>> {
    if input.is_eof() {
        return Ok(None);
    }

    let mut raw = Vec::new();
    let first = input.read_u8()?;
    raw.push(first);

    if first & 0b1000_0000 == 0 {
        return Err(Error::malformed("illegal packet header (high bit unset)"));
    }

    let (tag, len) = if first & 0b0100_0000 == 0 {
        // Old format: tag in bits 5..2, length-type in bits 1..0.
        let tag = (first >> 2) & 0x0F;
        let length_type = first & 0x03;
        let len = match length_type {
            0 => read_be(input, &mut raw, 1)?,
            1 => read_be(input, &mut raw, 2)?,
            2 => read_be(input, &mut raw, 4)?,
            _ => {
                return Err(Error::malformed(
                    "indeterminate-length old-format packets are not supported",
                ))
            }
        };
        (tag, len)
    } else {
        // New format: tag in bits 5..0, RFC 4880 length encoding follows.
        let tag = first & 0x3F;
        let b0 = read_raw_u8(input, &mut raw)?;
        let len = match b0 {
            0..=191 => b0 as usize,
            192..=223 => {
                let b1 = read_raw_u8(input, &mut raw)?;
                ((b0 as usize - 192) << 8) + b1 as usize + 192
            }
            255 => read_be(input, &mut raw, 4)?,
            224..=254 => {
                return Err(Error::malformed(
                    "partial-length packet bodies are not supported",
                ))
            }
        };
        (tag, len)
    };

    let mut body = vec![0u8; len];
    input.read_exact(&mut body)?;
    raw.extend_from_slice(&body);

    Ok(Some(RawPacket { tag, body, raw }))
}

fn read_raw_u8(input: &mut impl Readable, raw: &mut Vec<u8>) -> Result<u8> {
    let b = input.read_u8()?;
    raw.push(b);
    Ok(b)
}

fn read_be(input: &mut impl Readable, raw: &mut Vec<u8>, n: usize) -> Result<usize> {
    let mut value: usize = 0;
    for _ in 0..n {
        value = (value << 8) | read_raw_u8(input, raw)? as usize;
    }
    Ok(value)
}

/// Scans forward, discarding packets whose tag is neither `wanted` nor
/// `alt`, and returns the first matching one (or `None` at clean EOF).
pub fn find(input: &mut impl Readable, wanted: u8, alt: Option<u8>) -> Result<Option<RawPacket>> {
    while let Some(packet) = read_next(input)? {
        if packet.tag == wanted || alt == Some(packet.tag) {
            return Ok(Some(packet));
        }
    }
    Ok(None)
}

/// Parses every packet in `input` in order, preserving each one's raw bytes.
pub fn read_all(input: &mut impl Readable) -> Result<Vec<RawPacket>> {
    let mut packets = Vec::new();
    while let Some(packet) = read_next(input)? {
        packets.push(packet);
    }
    Ok(packets)
}

/// Emits an OpenPGP packet header for `tag`/`length`. Old format when `tag <
/// 16` (using the smallest sufficient 1/2/4-byte length), new format
/// otherwise (smallest of the 1/2/5-byte RFC 4880 encodings). Never emits a
/// partial-length or indeterminate-length header.
pub fn encode_header(tag: u8, length: usize) -> Vec<u8> {
    let mut out = Vec::new();
    if tag < 16 {
        if length < 256 {
            out.push(0b1000_0000 | (tag << 2));
            out.push(length as u8);
        } else if length < 65536 {
            out.push(0b1000_0001 | (tag << 2));
            out.extend_from_slice(&(length as u16).to_be_bytes());
        } else {
            out.push(0b1000_0010 | (tag << 2));
            out.extend_from_slice(&(length as u32).to_be_bytes());
        }
    } else {
        out.push(0b1100_0000 | tag);
        if length < 192 {
            out.push(length as u8);
        } else if length < 8384 {
            out.push(((length - 192) >> 8) as u8 + 192);
            out.push(((length - 192) & 0xFF) as u8);
        } else {
            out.push(255);
            out.extend_from_slice(&(length as u32).to_be_bytes());
        }
    }
    out
}

/// Writes a packet's header and body to `output`.
pub fn write_packet(output: &mut impl Writable, tag: u8, body: &[u8]) -> Result<()> {
    output.write_bytes(&encode_header(tag, body.len()))?;
    output.write_bytes(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::ByteStream;

    #[test]
    fn old_format_one_byte_length() {
        // tag 5 (SecretKey), old format, 1-byte length: 0x80 | (5<<2) | 0 = 0x94.
        let mut s = ByteStream::from_vec(vec![0x94, 3, 0xAA, 0xBB, 0xCC]);
        let p = read_next(&mut s).unwrap().unwrap();
        assert_eq!(p.tag, 5);
        assert_eq!(p.body, vec![0xAA, 0xBB, 0xCC]);
        assert_eq!(p.raw, vec![0x94, 3, 0xAA, 0xBB, 0xCC]);
    }

    #[test]
    fn new_format_two_byte_length() {
        // tag 5, new format: 0xC0 | 5 = 0xC5; length 300 -> 192..223 encoding.
        let len = 300usize;
        let b0 = ((len - 192) >> 8) as u8 + 192;
        let b1 = ((len - 192) & 0xFF) as u8;
        let mut body = vec![0u8; len];
        body[0] = 0x11;
        let mut raw = vec![0xC5, b0, b1];
        raw.extend_from_slice(&body);
        let mut s = ByteStream::from_vec(raw);
        let p = read_next(&mut s).unwrap().unwrap();
        assert_eq!(p.tag, 5);
        assert_eq!(p.body.len(), len);
        assert_eq!(p.body[0], 0x11);
    }

    #[test]
    fn new_format_partial_length_is_malformed() {
        let mut s = ByteStream::from_vec(vec![0xC5, 224]);
        assert!(read_next(&mut s).is_err());
    }

    #[test]
    fn old_format_indeterminate_length_is_malformed() {
        let mut s = ByteStream::from_vec(vec![0b1000_0011]);
        assert!(read_next(&mut s).is_err());
    }

    #[test]
    fn illegal_header_top_bit_unset() {
        let mut s = ByteStream::from_vec(vec![0x00]);
        assert!(read_next(&mut s).is_err());
    }

    #[test]
    fn find_skips_uninteresting_tags() {
        // A user-id packet (tag 13, new format, 1-byte length) then a secret subkey (tag 7).
        let mut raw = vec![0xC0 | 13, 2, b'h', b'i'];
        raw.extend_from_slice(&encode_header(7, 2));
        raw.extend_from_slice(&[0x01, 0x02]);
        let mut s = ByteStream::from_vec(raw);
        let p = find(&mut s, TAG_SECRET_SUBKEY, Some(TAG_SECRET_KEY))
            .unwrap()
            .unwrap();
        assert_eq!(p.tag, 7);
        assert_eq!(p.body, vec![0x01, 0x02]);
    }

    #[test]
    fn encode_header_old_format_for_low_tags() {
        let h = encode_header(5, 10);
        assert_eq!(h, vec![0b1000_0000 | (5 << 2), 10]);
    }

    #[test]
    fn encode_header_new_format_for_high_tags() {
        let h = encode_header(19, 10);
        assert_eq!(h, vec![0b1100_0000 | 19, 10]);
    }

    #[test]
    fn round_trip_header_then_reparse() {
        let body = vec![1, 2, 3, 4, 5];
        let mut s = ByteStream::new();
        write_packet(&mut s, TAG_PUBLIC_SUBKEY, &body).unwrap();
        s.rewind();
        let p = read_next(&mut s).unwrap().unwrap();
        assert_eq!(p.tag, TAG_PUBLIC_SUBKEY);
        assert_eq!(p.body, body);
    }
}

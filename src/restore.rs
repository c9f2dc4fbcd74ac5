//! The restore pipeline: a public key plus a paper-key artifact in, a
//! reassembled secret key out.
//!
//! The distilled spec's merge algorithm (§4.10/§4.11) had no surviving
//! `restore.c` in `original_source/` to ground against directly; this
//! follows the spec's merge description, built in the same shape as
//! [`crate::extract`] (packet scan, then a small in-memory record list, then
//! a single re-emission pass).

use log::{debug, warn};

use crate::error::{Error, Result};
use crate::fingerprint::Fingerprint;
use crate::framer;
use crate::packet::{self, RawPacket, TAG_PUBLIC_KEY, TAG_PUBLIC_SUBKEY};
use crate::policy::{Framing, Policy};
use crate::stream::{Readable, Writable};

/// One decoded paper-key record: the fingerprint of the public key it
/// belongs to, and the secret-region bytes to append to that key's public
/// body.
struct Record {
    key_version: u8,
    fingerprint: [u8; 20],
    secret: Vec<u8>,
}

const FORMAT_VERSION: u8 = 0;
const FINGERPRINT_LEN: usize = 20;

/// Parses the paper-key format version octet and the record list.
fn parse_records(payload: &[u8]) -> Result<Vec<Record>> {
    let mut cur = payload;

    let version = take_u8(&mut cur)?;
    if version != FORMAT_VERSION {
        return Err(Error::UnsupportedFormatVersion { version });
    }

    let mut records = Vec::new();
    while !cur.is_empty() {
        let key_version = take_u8(&mut cur)?;
        let fingerprint = take_n::<FINGERPRINT_LEN>(&mut cur)?;
        let len_bytes = take_n::<2>(&mut cur)?;
        let len = u16::from_be_bytes(len_bytes) as usize;
        let secret = take_slice(&mut cur, len)?.to_vec();
        records.push(Record {
            key_version,
            fingerprint,
            secret,
        });
    }
    Ok(records)
}

fn take_u8(cur: &mut &[u8]) -> Result<u8> {
    let (first, rest) = cur
        .split_first()
        .ok_or_else(|| Error::malformed("paper key ended before expected field"))?;
    *cur = rest;
    Ok(*first)
}

fn take_n<const N: usize>(cur: &mut &[u8]) -> Result<[u8; N]> {
    if cur.len() < N {
        return Err(Error::malformed("paper key ended before expected field"));
    }
    let mut out = [0u8; N];
    out.copy_from_slice(&cur[..N]);
    *cur = &cur[N..];
    Ok(out)
}

fn take_slice<'a>(cur: &mut &'a [u8], n: usize) -> Result<&'a [u8]> {
    if cur.len() < n {
        return Err(Error::malformed("paper key secret region is truncated"));
    }
    let (head, tail) = cur.split_at(n);
    *cur = tail;
    Ok(head)
}

/// Reassembles a secret key from `public_key` and `paper_key`, writing the
/// result to `output`.
pub fn restore(
    public_key: &mut impl Readable,
    paper_key: &mut impl Readable,
    output: &mut impl Writable,
    input_framing: Framing,
    policy: Policy,
) -> Result<()> {
    let framing = match input_framing {
        Framing::Auto => framer::sniff_framing(paper_key)?,
        other => other,
    };

    let payload = match framing {
        Framing::Base16 => framer::decode_base16(paper_key)?,
        Framing::Raw => framer::decode_raw(paper_key)?,
        Framing::Auto => unreachable!("sniffed above"),
    };

    let mut records = parse_records(&payload)?;
    if records.is_empty() {
        return Err(Error::NoSecretKey);
    }
    let primary = records.remove(0);
    let subkeys = records;

    let public_packets = packet::read_all(public_key)?;

    let mut claimed = vec![false; public_packets.len()];
    let mut reassembled: Vec<Option<(u8, Vec<u8>)>> = vec![None; public_packets.len()];

    let primary_idx = find_match(&public_packets, &claimed, TAG_PUBLIC_KEY, &primary.fingerprint)
        .ok_or_else(|| Error::FingerprintMismatch {
            fingerprint: Fingerprint(primary.fingerprint).to_string(),
        })?;
    debug!(
        "primary: matched public packet at index {primary_idx}, fingerprint {}",
        Fingerprint(primary.fingerprint)
    );
    claimed[primary_idx] = true;
    reassembled[primary_idx] = Some((
        packet::TAG_SECRET_KEY,
        merged_body(&public_packets[primary_idx], &primary),
    ));

    for subkey in &subkeys {
        match find_match(&public_packets, &claimed, TAG_PUBLIC_SUBKEY, &subkey.fingerprint) {
            Some(idx) => {
                debug!(
                    "subkey: matched public packet at index {idx}, fingerprint {}",
                    Fingerprint(subkey.fingerprint)
                );
                claimed[idx] = true;
                reassembled[idx] = Some((
                    packet::TAG_SECRET_SUBKEY,
                    merged_body(&public_packets[idx], subkey),
                ));
            }
            None => {
                let fpr = Fingerprint(subkey.fingerprint);
                if policy.is_strict() {
                    return Err(Error::FingerprintMismatch {
                        fingerprint: fpr.to_string(),
                    });
                }
                warn!("no matching public subkey for paper-key record with fingerprint {fpr}; dropping it");
            }
        }
    }

    for (idx, public_packet) in public_packets.iter().enumerate() {
        match &reassembled[idx] {
            Some((tag, body)) => packet::write_packet(output, *tag, body)?,
            None => output.write_bytes(&public_packet.raw)?,
        }
    }

    Ok(())
}

fn merged_body(public_packet: &RawPacket, record: &Record) -> Vec<u8> {
    debug_assert_eq!(record.key_version, 4);
    let mut body = public_packet.body.clone();
    body.extend_from_slice(&record.secret);
    body
}

fn find_match(
    packets: &[RawPacket],
    claimed: &[bool],
    tag: u8,
    fingerprint: &[u8; 20],
) -> Option<usize> {
    packets.iter().enumerate().find_map(|(idx, packet)| {
        if claimed[idx] || packet.tag != tag {
            return None;
        }
        let fpr = Fingerprint::compute(&packet.body);
        (fpr.as_bytes() == fingerprint).then_some(idx)
    })
}

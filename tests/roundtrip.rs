//! End-to-end extract/restore scenarios, one per supported key algorithm,
//! plus the width-clamp and tamper-detection boundaries the artifact's
//! checksums exist to catch.

use hex_literal::hex;
use pretty_assertions::assert_eq;

use paperkey::error::{CrcLine, Error};
use paperkey::policy::Policy;
use paperkey::{extract, restore, ByteStream, Framing};

fn mpi(bits: u16, value: &[u8]) -> Vec<u8> {
    let mut out = bits.to_be_bytes().to_vec();
    out.extend_from_slice(value);
    out
}

/// Builds a public sub-structure (version, creation time, algorithm, then
/// algorithm-specific public fields) for each family the secret locator
/// supports.
fn public_prefix_rsa() -> Vec<u8> {
    let mut b = vec![4u8];
    b.extend_from_slice(&1_700_000_000u32.to_be_bytes());
    b.push(1); // RSA
    b.extend_from_slice(&mpi(16, &[0x01, 0x00])); // n
    b.extend_from_slice(&mpi(8, &[0x11])); // e
    b
}

fn public_prefix_dsa() -> Vec<u8> {
    let mut b = vec![4u8];
    b.extend_from_slice(&1_700_000_001u32.to_be_bytes());
    b.push(17); // DSA
    for byte in [0x01u8, 0x02, 0x03, 0x04] {
        b.extend_from_slice(&mpi(8, &[byte]));
    }
    b
}

fn public_prefix_elgamal() -> Vec<u8> {
    let mut b = vec![4u8];
    b.extend_from_slice(&1_700_000_002u32.to_be_bytes());
    b.push(16); // Elgamal
    for byte in [0x05u8, 0x06, 0x07] {
        b.extend_from_slice(&mpi(8, &[byte]));
    }
    b
}

fn public_prefix_ecdsa() -> Vec<u8> {
    let mut b = vec![4u8];
    b.extend_from_slice(&1_700_000_003u32.to_be_bytes());
    b.push(19); // ECDSA
    b.push(3); // OID length
    b.extend_from_slice(&[0x2B, 0x81, 0x04]);
    b.extend_from_slice(&mpi(8, &[0x09]));
    b
}

fn public_prefix_eddsa() -> Vec<u8> {
    let mut b = vec![4u8];
    b.extend_from_slice(&1_700_000_004u32.to_be_bytes());
    b.push(22); // EdDSA
    b.push(9); // ed25519 OID length
    b.extend_from_slice(&[0x2B, 0x06, 0x01, 0x04, 0x01, 0xDA, 0x47, 0x0F, 0x01]);
    b.extend_from_slice(&mpi(8, &[0x0A]));
    b
}

fn public_prefix_ecdh() -> Vec<u8> {
    let mut b = vec![4u8];
    b.extend_from_slice(&1_700_000_005u32.to_be_bytes());
    b.push(18); // ECDH
    b.push(3);
    b.extend_from_slice(&[0x2B, 0x81, 0x04]);
    b.extend_from_slice(&mpi(8, &[0x0B]));
    b.push(3); // KDF param block length
    b.extend_from_slice(&[0x01, 0x08, 0x09]);
    b
}

fn secret_packet(tag: u8, public_prefix: &[u8], secret_tail: &[u8]) -> Vec<u8> {
    let mut body = public_prefix.to_vec();
    body.extend_from_slice(secret_tail);
    let mut raw = paperkey::packet::encode_header(tag, body.len());
    raw.extend_from_slice(&body);
    raw
}

fn public_packet(tag: u8, public_prefix: &[u8]) -> Vec<u8> {
    let mut raw = paperkey::packet::encode_header(tag, public_prefix.len());
    raw.extend_from_slice(public_prefix);
    raw
}

fn assert_round_trips(public_prefix: Vec<u8>, secret_tail: &[u8], framing: Framing) {
    let secret_raw = secret_packet(paperkey::packet::TAG_SECRET_KEY, &public_prefix, secret_tail);
    let mut input = ByteStream::from_vec(secret_raw.clone());
    let mut paper = ByteStream::new();
    extract(&mut input, &mut paper, framing, 78).expect("extract");
    paper.rewind();

    let mut pubring = ByteStream::from_vec(public_packet(
        paperkey::packet::TAG_PUBLIC_KEY,
        &public_prefix,
    ));
    let mut output = ByteStream::new();
    restore(
        &mut pubring,
        &mut paper,
        &mut output,
        framing,
        Policy::permissive(),
    )
    .expect("restore");

    assert_eq!(output.into_inner(), secret_raw);
}

#[test]
fn rsa_round_trips_raw_and_base16() {
    let secret_tail = hex!("00 DE AD BE EF");
    assert_round_trips(public_prefix_rsa(), &secret_tail, Framing::Raw);
    assert_round_trips(public_prefix_rsa(), &secret_tail, Framing::Base16);
}

#[test]
fn dsa_round_trips() {
    assert_round_trips(public_prefix_dsa(), &[0x00, 0x01, 0x02, 0x03], Framing::Raw);
    assert_round_trips(public_prefix_dsa(), &[0x00, 0x01, 0x02, 0x03], Framing::Base16);
}

#[test]
fn elgamal_subkey_round_trips() {
    // A DSA primary with an Elgamal subkey, as a real transferable secret
    // key typically pairs them.
    let primary_prefix = public_prefix_dsa();
    let primary_tail = [0x00u8, 0xAA];
    let subkey_prefix = public_prefix_elgamal();
    let subkey_tail = [0x00u8, 0xBB, 0xCC];

    let mut secret_bytes = secret_packet(
        paperkey::packet::TAG_SECRET_KEY,
        &primary_prefix,
        &primary_tail,
    );
    secret_bytes.extend_from_slice(&secret_packet(
        paperkey::packet::TAG_SECRET_SUBKEY,
        &subkey_prefix,
        &subkey_tail,
    ));

    let mut input = ByteStream::from_vec(secret_bytes.clone());
    let mut paper = ByteStream::new();
    extract(&mut input, &mut paper, Framing::Raw, 78).expect("extract");
    paper.rewind();

    let mut pub_bytes = public_packet(paperkey::packet::TAG_PUBLIC_KEY, &primary_prefix);
    pub_bytes.extend_from_slice(&public_packet(
        paperkey::packet::TAG_PUBLIC_SUBKEY,
        &subkey_prefix,
    ));

    let mut pubring = ByteStream::from_vec(pub_bytes);
    let mut output = ByteStream::new();
    restore(
        &mut pubring,
        &mut paper,
        &mut output,
        Framing::Raw,
        Policy::permissive(),
    )
    .expect("restore");

    assert_eq!(output.into_inner(), secret_bytes);
}

#[test]
fn ecdsa_round_trips() {
    assert_round_trips(public_prefix_ecdsa(), &[0x00, 0x42], Framing::Raw);
    assert_round_trips(public_prefix_ecdsa(), &[0x00, 0x42], Framing::Base16);
}

#[test]
fn eddsa_round_trips() {
    assert_round_trips(public_prefix_eddsa(), &[0x00, 0x07, 0x07], Framing::Raw);
    assert_round_trips(public_prefix_eddsa(), &[0x00, 0x07, 0x07], Framing::Base16);
}

#[test]
fn ecdh_round_trips() {
    assert_round_trips(public_prefix_ecdh(), &[0x00, 0x99], Framing::Raw);
    assert_round_trips(public_prefix_ecdh(), &[0x00, 0x99], Framing::Base16);
}

#[test]
fn width_clamp_matches_raw_extraction_and_respects_line_length() {
    let public_prefix = public_prefix_rsa();
    let secret_tail = [0x00u8, 0x11, 0x22, 0x33, 0x44, 0x55];
    let secret_raw = secret_packet(paperkey::packet::TAG_SECRET_KEY, &public_prefix, &secret_tail);

    let mut raw_input = ByteStream::from_vec(secret_raw.clone());
    let mut raw_paper = ByteStream::new();
    extract(&mut raw_input, &mut raw_paper, Framing::Raw, 78).unwrap();
    raw_paper.rewind();
    let raw_payload = paperkey::framer::decode_raw(&mut raw_paper).unwrap();

    let mut narrow_input = ByteStream::from_vec(secret_raw);
    let mut narrow_paper = ByteStream::new();
    extract(&mut narrow_input, &mut narrow_paper, Framing::Base16, 40).unwrap();

    let text = String::from_utf8(narrow_paper.as_slice().to_vec()).unwrap();
    for line in text.lines() {
        assert!(line.len() <= 40, "line exceeds configured width: {line:?}");
    }

    narrow_paper.rewind();
    let narrow_payload = paperkey::framer::decode_base16(&mut narrow_paper).unwrap();
    assert_eq!(raw_payload, narrow_payload);
}

#[test]
fn tampered_base16_artifact_reports_the_offending_line() {
    let public_prefix = public_prefix_rsa();
    let secret_tail = vec![0xAAu8; 100];
    let secret_raw = secret_packet(paperkey::packet::TAG_SECRET_KEY, &public_prefix, &secret_tail);

    let mut input = ByteStream::from_vec(secret_raw);
    let mut paper = ByteStream::new();
    extract(&mut input, &mut paper, Framing::Base16, 78).unwrap();

    let mut bytes = paper.into_inner();
    // Flip a nibble well inside the data region, past the comment header.
    let data_start = String::from_utf8_lossy(&bytes).find("\n\n").unwrap() + 2;
    // "NNN: " is 5 characters; this lands on the first hex digit of the
    // first line's first octet, never on a separating space.
    let flip_at = data_start + 5;
    bytes[flip_at] = if bytes[flip_at].is_ascii_digit() {
        b'f'
    } else {
        b'0'
    };

    let mut tampered = ByteStream::from_vec(bytes);
    let mut pubring = ByteStream::from_vec(public_packet(
        paperkey::packet::TAG_PUBLIC_KEY,
        &public_prefix,
    ));
    let mut output = ByteStream::new();
    let err = restore(
        &mut pubring,
        &mut tampered,
        &mut output,
        Framing::Base16,
        Policy::permissive(),
    )
    .unwrap_err();

    assert!(matches!(err, Error::CrcMismatch { line: CrcLine::Line(_) }));
}

#[test]
fn v3_secret_key_is_rejected() {
    let mut body = vec![3u8];
    body.extend_from_slice(&0u32.to_be_bytes());
    body.push(1);
    body.push(0xFF);
    let mut raw = paperkey::packet::encode_header(paperkey::packet::TAG_SECRET_KEY, body.len());
    raw.extend_from_slice(&body);

    let mut input = ByteStream::from_vec(raw);
    let mut output = ByteStream::new();
    let err = extract(&mut input, &mut output, Framing::Raw, 78).unwrap_err();
    assert!(matches!(err, Error::UnsupportedVersion { version: 3 }));
}

#[test]
fn partial_length_new_format_header_is_malformed() {
    // New-format header, tag 5, first length octet in the 224..=254 range.
    let raw = vec![0b1100_0000 | 5, 224];
    let mut input = ByteStream::from_vec(raw);
    let mut output = ByteStream::new();
    let err = extract(&mut input, &mut output, Framing::Raw, 78).unwrap_err();
    assert!(matches!(err, Error::Malformed { .. }));
}

#[test]
fn restore_fails_when_primary_fingerprint_is_absent() {
    let public_prefix = public_prefix_rsa();
    let secret_raw = secret_packet(paperkey::packet::TAG_SECRET_KEY, &public_prefix, &[0x00, 0x01]);
    let mut input = ByteStream::from_vec(secret_raw);
    let mut paper = ByteStream::new();
    extract(&mut input, &mut paper, Framing::Raw, 78).unwrap();
    paper.rewind();

    let mut unrelated_prefix = public_prefix_rsa();
    unrelated_prefix[1] = 0xFF; // different creation time -> different fingerprint
    let mut pubring = ByteStream::from_vec(public_packet(
        paperkey::packet::TAG_PUBLIC_KEY,
        &unrelated_prefix,
    ));
    let mut output = ByteStream::new();
    let err = restore(
        &mut pubring,
        &mut paper,
        &mut output,
        Framing::Raw,
        Policy::permissive(),
    )
    .unwrap_err();
    assert!(matches!(err, Error::FingerprintMismatch { .. }));
}

#[test]
fn secret_region_of_65536_bytes_overflows_at_emit_time() {
    let public_prefix = public_prefix_rsa();
    let secret_raw = secret_packet(
        paperkey::packet::TAG_SECRET_KEY,
        &public_prefix,
        &vec![0u8; 65_536],
    );
    let mut input = ByteStream::from_vec(secret_raw);
    let mut output = ByteStream::new();
    let err = extract(&mut input, &mut output, Framing::Raw, 78).unwrap_err();
    assert!(matches!(err, Error::LengthOverflow { len: 65_536 }));
}

//! Locates the secret region inside a v4 secret-key packet body, and a small
//! zeroizing wrapper for carrying that region around in memory afterwards.

use bytes::Buf;
use zeroize::Zeroize;

use crate::error::{Error, Result};

/// RSA (encrypt-only, sign-only, and general-purpose share a layout).
const ALGO_RSA_ENCRYPT_SIGN: u8 = 1;
const ALGO_RSA_ENCRYPT_ONLY: u8 = 2;
const ALGO_RSA_SIGN_ONLY: u8 = 3;
const ALGO_ELGAMAL: u8 = 16;
const ALGO_DSA: u8 = 17;
const ALGO_ECDH: u8 = 18;
const ALGO_ECDSA: u8 = 19;
const ALGO_EDDSA: u8 = 22;

/// Returns the offset of the first byte past the public sub-structure of a
/// v4 key packet body — i.e. the start of the S2K-usage octet.
pub fn locate_secret_region(body: &[u8]) -> Result<usize> {
    let mut cur = body;

    let version = read_u8(&mut cur)?;
    if version != 4 {
        return Err(Error::UnsupportedVersion { version });
    }

    skip(&mut cur, 4)?; // creation time

    let algorithm = read_u8(&mut cur)?;
    match algorithm {
        ALGO_RSA_ENCRYPT_SIGN | ALGO_RSA_ENCRYPT_ONLY | ALGO_RSA_SIGN_ONLY => {
            // n, e
            skip_mpi(&mut cur)?;
            skip_mpi(&mut cur)?;
        }
        ALGO_ELGAMAL => {
            // p, g, y
            for _ in 0..3 {
                skip_mpi(&mut cur)?;
            }
        }
        ALGO_DSA => {
            // p, q, g, y
            for _ in 0..4 {
                skip_mpi(&mut cur)?;
            }
        }
        ALGO_ECDH => {
            skip_oid(&mut cur)?;
            skip_mpi(&mut cur)?; // point
            skip_length_prefixed(&mut cur)?; // KDF parameter block
        }
        ALGO_ECDSA | ALGO_EDDSA => {
            skip_oid(&mut cur)?;
            skip_mpi(&mut cur)?; // point
        }
        other => return Err(Error::UnsupportedAlgorithm { algorithm: other }),
    }

    Ok(body.len() - cur.remaining())
}

fn read_u8(cur: &mut &[u8]) -> Result<u8> {
    if cur.remaining() < 1 {
        return Err(Error::malformed("key packet ended before expected field"));
    }
    Ok(cur.get_u8())
}

fn read_be_u16(cur: &mut &[u8]) -> Result<u16> {
    if cur.remaining() < 2 {
        return Err(Error::malformed("key packet ended before expected field"));
    }
    Ok(cur.get_u16())
}

fn skip(cur: &mut &[u8], n: usize) -> Result<()> {
    if cur.remaining() < n {
        return Err(Error::malformed("key packet ended before expected field"));
    }
    cur.advance(n);
    Ok(())
}

/// An MPI is a 2-byte big-endian bit count followed by `ceil(bits/8)` bytes.
fn skip_mpi(cur: &mut &[u8]) -> Result<()> {
    let bits = read_be_u16(cur)? as usize;
    let len = bits.div_ceil(8);
    skip(cur, len)
}

/// A curve OID is a 1-byte length followed by that many bytes.
fn skip_oid(cur: &mut &[u8]) -> Result<()> {
    skip_length_prefixed(cur)
}

fn skip_length_prefixed(cur: &mut &[u8]) -> Result<()> {
    let len = read_u8(cur)? as usize;
    skip(cur, len)
}

/// A secret region held in memory, wiped when dropped. Its contents are
/// never logged; only its length and the public fingerprint that identifies
/// the key it belongs to are.
#[derive(Clone, Eq, PartialEq, derive_more::Debug)]
#[debug("Secret({} bytes)", self.0.len())]
pub struct Secret(Vec<u8>);

impl Secret {
    pub fn new(bytes: Vec<u8>) -> Self {
        Secret(bytes)
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_vec(mut self) -> Vec<u8> {
        std::mem::take(&mut self.0)
    }
}

impl std::ops::Deref for Secret {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl Drop for Secret {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

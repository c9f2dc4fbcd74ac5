//! The v4 OpenPGP key fingerprint: SHA-1 over `0x99 ‖ len(16 BE) ‖ public-prefix`.

use std::fmt;

use sha1::{Digest, Sha1};

/// A 20-byte v4 key or subkey fingerprint.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint(pub [u8; 20]);

impl Fingerprint {
    /// Computes the fingerprint of a v4 key over its public prefix: the
    /// public sub-structure of a secret-key packet body, or the entire body
    /// of a public-key packet.
    pub fn compute(public_prefix: &[u8]) -> Self {
        let mut hasher = Sha1::new();
        hasher.update([0x99]);
        hasher.update((public_prefix.len() as u16).to_be_bytes());
        hasher.update(public_prefix);

        let digest = hasher.finalize();
        let mut out = [0u8; 20];
        out.copy_from_slice(&digest);
        Fingerprint(out)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode_upper(self.0))
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({self})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_known_vector() {
        // A minimal v4 RSA public key: version, creation time, algorithm,
        // then MPIs for a tiny 8-bit n and e. The fingerprint is just
        // SHA-1(0x99 || len16 || body); this pins that construction rather
        // than asserting a value carried over from elsewhere.
        let body: Vec<u8> = {
            let mut b = vec![4u8];
            b.extend_from_slice(&0x5A4A_5A4Au32.to_be_bytes()); // creation time
            b.push(1); // RSA
            b.extend_from_slice(&8u16.to_be_bytes()); // n: 8 bits
            b.push(0xFF);
            b.extend_from_slice(&8u16.to_be_bytes()); // e: 8 bits
            b.push(0x11);
            b
        };

        let fpr = Fingerprint::compute(&body);

        let mut hasher = Sha1::new();
        hasher.update([0x99]);
        hasher.update((body.len() as u16).to_be_bytes());
        hasher.update(&body);
        let expected = hasher.finalize();

        assert_eq!(&fpr.0[..], &expected[..]);
    }

    #[test]
    fn display_is_uppercase_hex_40_chars() {
        let fpr = Fingerprint([0xAB; 20]);
        let text = fpr.to_string();
        assert_eq!(text.len(), 40);
        assert_eq!(text, text.to_uppercase());
    }
}

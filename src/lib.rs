//! Extract the secret-bearing portions of an OpenPGP transferable secret key
//! into a compact, printable paper-key artifact, and restore a full secret
//! key by combining that artifact with the matching public key.
//!
//! Only the material that cannot be recomputed from the public key is ever
//! written out: the S2K-usage octet and everything after it in a v4
//! secret-key or secret-subkey packet. The artifact is self-checking via a
//! per-line and a whole-stream CRC-24, but it is not encrypted — treat the
//! physical medium as the confidentiality boundary.
//!
//! This crate performs no cryptography: it never decrypts, signs, verifies,
//! or generates a key. It only locates, copies, and re-frames bytes.

pub mod crc24;
pub mod error;
pub mod extract;
pub mod fingerprint;
pub mod framer;
pub mod packet;
pub mod policy;
pub mod restore;
pub mod secret;
pub mod stream;

pub use error::{Error, Result};
pub use extract::extract;
pub use fingerprint::Fingerprint;
pub use policy::{Framing, Policy, Strictness};
pub use restore::restore;
pub use stream::{ByteStream, Readable, Writable};

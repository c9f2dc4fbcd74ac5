//! Error types for the paper-key extract/restore engine.

use derive_more::Display;
use snafu::Snafu;

/// Convenience alias for results produced by this crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Identifies which CRC-24 check failed: a specific base-16 data line, or the
/// whole-stream check that terminates every artifact (base-16's final line, or
/// raw mode's trailing three bytes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum CrcLine {
    #[display("line {_0}")]
    Line(u32),
    #[display("final")]
    Final,
}

/// Every way extract or restore can fail.
///
/// The core never attempts to repair a malformed or tampered input: every
/// variant here aborts the pipeline call that produced it.
#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum Error {
    #[snafu(display("no secret key packet found in input"))]
    NoSecretKey,

    #[snafu(display("unsupported key packet version {version} (only v4 is supported)"))]
    UnsupportedVersion { version: u8 },

    #[snafu(display("unsupported paper key format version {version} (only 0 is supported)"))]
    UnsupportedFormatVersion { version: u8 },

    #[snafu(display("unsupported public-key algorithm {algorithm}"))]
    UnsupportedAlgorithm { algorithm: u8 },

    #[snafu(display("malformed input: {reason}"))]
    Malformed { reason: String },

    #[snafu(display("CRC-24 mismatch at {line}"))]
    CrcMismatch { line: CrcLine },

    #[snafu(display("no public key packet matches fingerprint {fingerprint}"))]
    FingerprintMismatch { fingerprint: String },

    #[snafu(display("secret region of {len} bytes exceeds the 65535 byte limit"))]
    LengthOverflow { len: usize },

    #[snafu(display("I/O error: {source}"))]
    Io { source: std::io::Error },
}

impl Error {
    pub fn malformed(reason: impl Into<String>) -> Self {
        Error::Malformed {
            reason: reason.into(),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(source: std::io::Error) -> Self {
        Error::Io { source }
    }
}

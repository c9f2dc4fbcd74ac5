//! Explicit parameter blocks that replace the original tool's process-wide
//! globals (`verbose`, the active output type, ...): a `Framing` choice and a
//! `Strictness` choice, threaded through the pipelines instead of living as
//! statics.

/// Selects how a paper-key artifact is encoded or decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Framing {
    /// Binary payload followed by a 3-byte big-endian CRC-24.
    Raw,
    /// Line-oriented base-16 text with per-line and whole-stream CRC-24s.
    #[default]
    Base16,
    /// Restore-only: sniff the first non-whitespace byte of the input to
    /// decide between `Base16` and `Raw`.
    Auto,
}

/// How restore treats a public key whose subkeys don't all have a matching
/// paper-key record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strictness {
    /// Drop uncovered subkey records with a warning; keep the public subkey
    /// as-is. This is the original tool's behavior and the default here.
    #[default]
    Permissive,
    /// Fail the whole restore if any subkey lacks a matching record.
    Strict,
}

/// Parameters threaded through the restore pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Policy {
    pub strictness: Strictness,
}

impl Policy {
    pub fn permissive() -> Self {
        Policy {
            strictness: Strictness::Permissive,
        }
    }

    pub fn strict() -> Self {
        Policy {
            strictness: Strictness::Strict,
        }
    }

    pub fn is_strict(&self) -> bool {
        self.strictness == Strictness::Strict
    }
}

/// Output width in columns for base-16 framing. Default matches the
/// original tool's 78-column terminal assumption.
pub const DEFAULT_OUTPUT_WIDTH: usize = 78;

/// Smallest width that can hold at least one hex octet per line, per §4.7's
/// `line_items = (output_width - 5 - 6) / 3` budget.
pub const MIN_OUTPUT_WIDTH: usize = 14;

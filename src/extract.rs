//! The extract pipeline: secret key blob in, paper-key artifact out.
//!
//! Grounded on `original_source/.../extract.c`'s `extract_secrets` driver
//! loop, recast around this crate's `packet`/`secret`/`fingerprint`/`framer`
//! modules instead of raw file descriptors and a global `output_type`.

use log::debug;

use crate::error::{Error, Result};
use crate::fingerprint::Fingerprint;
use crate::framer::{self, Writer};
use crate::packet::{self, TAG_SECRET_KEY, TAG_SECRET_SUBKEY};
use crate::policy::Framing;
use crate::secret;
use crate::stream::{Readable, Writable};

/// Maximum secret-region length a paper-key record can carry (§6).
const MAX_SECRET_LEN: usize = u16::MAX as usize;

/// Extracts the secret-bearing portions of `secret_key` (an OpenPGP
/// transferable secret key, tags 5/7 of interest) into a paper-key artifact
/// written to `output`, framed per `framing`.
pub fn extract(
    secret_key: &mut impl Readable,
    output: &mut impl Writable,
    framing: Framing,
    output_width: usize,
) -> Result<()> {
    // `Auto` is restore-only; on the output side it is equivalent to `Base16`.
    let framing = match framing {
        Framing::Auto => Framing::Base16,
        other => other,
    };

    let primary = packet::find(secret_key, TAG_SECRET_KEY, None)?.ok_or(Error::NoSecretKey)?;
    let primary_offset = secret::locate_secret_region(&primary.body)?;
    let primary_fpr = Fingerprint::compute(&primary.body[..primary_offset]);
    debug!(
        "primary key: secret offset {primary_offset}, fingerprint {primary_fpr}"
    );

    let mut writer = Writer::begin(output, framing, &primary_fpr, output_width)?;
    write_version_octet(output, &mut writer)?;
    write_record(
        output,
        &mut writer,
        primary.body[0],
        &primary_fpr,
        &primary.body[primary_offset..],
    )?;

    while let Some(subkey) = packet::find(secret_key, TAG_SECRET_SUBKEY, Some(TAG_SECRET_KEY))? {
        if subkey.tag != TAG_SECRET_SUBKEY {
            // `find`'s alt tag tolerates trailing primary-key fragments; they
            // carry no additional secret material worth recording.
            continue;
        }
        let offset = secret::locate_secret_region(&subkey.body)?;
        let fpr = Fingerprint::compute(&subkey.body[..offset]);
        debug!("subkey: secret offset {offset}, fingerprint {fpr}");
        write_record(output, &mut writer, subkey.body[0], &fpr, &subkey.body[offset..])?;
    }

    writer.finish(output)
}

fn write_version_octet(output: &mut impl Writable, writer: &mut Writer) -> Result<()> {
    writer.write_bytes(output, &[0u8])
}

fn write_record(
    output: &mut impl Writable,
    writer: &mut Writer,
    key_version: u8,
    fingerprint: &Fingerprint,
    secret: &[u8],
) -> Result<()> {
    if secret.len() > MAX_SECRET_LEN {
        return Err(Error::LengthOverflow { len: secret.len() });
    }
    writer.write_bytes(output, &[key_version])?;
    writer.write_bytes(output, fingerprint.as_bytes())?;
    writer.write_bytes(output, &(secret.len() as u16).to_be_bytes())?;
    writer.write_bytes(output, secret)
}

pub fn default_output_width() -> usize {
    framer::default_output_width()
}

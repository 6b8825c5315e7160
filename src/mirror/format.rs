//! Envelope for records kept in the client mirror.
//!
//! ```text
//! [version: u8][crc32 of payload: u32 LE][payload: JSON save record]
//! ```
//!
//! The checksum lets the mirror tell a damaged local entry from a record
//! that merely fails validation.

use thiserror::Error;

/// Current envelope version.
pub const ENVELOPE_VERSION: u8 = 1;

const CHECKSUM_LEN: usize = 4;

/// Errors decoding an envelope.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum EnvelopeError {
    #[error("entry is truncated")]
    Truncated,

    #[error("unsupported envelope version {0}")]
    UnsupportedVersion(u8),

    #[error("checksum mismatch: stored {stored:#010x}, computed {computed:#010x}")]
    ChecksumMismatch { stored: u32, computed: u32 },
}

/// Wrap a payload.
pub fn encode(payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(1 + CHECKSUM_LEN + payload.len());
    out.push(ENVELOPE_VERSION);
    out.extend_from_slice(&crc32fast::hash(payload).to_le_bytes());
    out.extend_from_slice(payload);
    out
}

/// Unwrap a payload, checking version and checksum.
pub fn decode(bytes: &[u8]) -> Result<&[u8], EnvelopeError> {
    let (&version, rest) = bytes.split_first().ok_or(EnvelopeError::Truncated)?;
    if version != ENVELOPE_VERSION {
        return Err(EnvelopeError::UnsupportedVersion(version));
    }

    let (checksum, payload) = rest
        .split_at_checked(CHECKSUM_LEN)
        .ok_or(EnvelopeError::Truncated)?;
    let stored = u32::from_le_bytes(checksum.try_into().map_err(|_| EnvelopeError::Truncated)?);
    let computed = crc32fast::hash(payload);
    if stored != computed {
        return Err(EnvelopeError::ChecksumMismatch { stored, computed });
    }

    Ok(payload)
}

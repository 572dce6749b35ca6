//! Wallet transaction encodings.
//!
//! Wallet adapters hand back serialized Solana transactions in one of two
//! encodings. The encoding is resolved once here, at the boundary, and the
//! rest of the code matches on the variant instead of re-reading the version byte.

use crate::error::{CoreError, Result};

const SIGNATURE_LEN: usize = 64;
const VERSION_PREFIX_MASK: u8 = 0x80;

/// A serialized transaction tagged with its encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletTransaction {
    /// Pre-versioning transaction format.
    Legacy { bytes: Vec<u8> },
    /// Versioned transaction (`v0` and later).
    Versioned { version: u8, bytes: Vec<u8> },
}

impl WalletTransaction {
    /// Classify a wire-format transaction.
    ///
    /// Layout: compact-u16 signature count, `count * 64` signature bytes,
    /// then the message. A versioned message starts with a byte whose high
    /// bit is set; the low seven bits carry the version.
    pub fn from_wire_bytes(bytes: Vec<u8>) -> Result<Self> {
        let (sig_count, prefix_len) = decode_compact_u16(&bytes)?;
        let message_offset = prefix_len + sig_count as usize * SIGNATURE_LEN;

        let first = *bytes.get(message_offset).ok_or_else(|| {
            CoreError::MalformedTransaction(format!(
                "expected message at offset {message_offset}, got {} bytes",
                bytes.len()
            ))
        })?;

        if first & VERSION_PREFIX_MASK != 0 {
            Ok(Self::Versioned {
                version: first & !VERSION_PREFIX_MASK,
                bytes,
            })
        } else {
            Ok(Self::Legacy { bytes })
        }
    }

    pub fn is_versioned(&self) -> bool {
        matches!(self, Self::Versioned { .. })
    }

    /// Version number, `None` for legacy transactions.
    pub fn version(&self) -> Option<u8> {
        match self {
            Self::Legacy { .. } => None,
            Self::Versioned { version, .. } => Some(*version),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Legacy { bytes } | Self::Versioned { bytes, .. } => bytes,
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Self::Legacy { bytes } | Self::Versioned { bytes, .. } => bytes,
        }
    }
}

/// Decode a Solana compact-u16 ("shortvec") length prefix.
///
/// Returns the value and the number of bytes consumed.
fn decode_compact_u16(bytes: &[u8]) -> Result<(u16, usize)> {
    let mut value: u32 = 0;
    for i in 0..3 {
        let byte = *bytes
            .get(i)
            .ok_or_else(|| CoreError::MalformedTransaction("truncated length prefix".into()))?;
        value |= u32::from(byte & 0x7f) << (7 * i);
        if byte & 0x80 == 0 {
            return u16::try_from(value)
                .map(|v| (v, i + 1))
                .map_err(|_| CoreError::MalformedTransaction("length prefix overflow".into()));
        }
    }
    Err(CoreError::MalformedTransaction(
        "length prefix longer than 3 bytes".into(),
    ))
}

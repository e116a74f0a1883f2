//! SHA256 verification of downloaded assets
//!
//! The validation asset starts with the hex digest of the primary asset
//! (the `sha256sum` layout: digest, whitespace, file name). Only the leading
//! 64 characters are read. Digests are compared case-insensitively.

use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::registry::RegistryError;

/// Length of a hex-encoded SHA256 digest
pub const DIGEST_HEX_LEN: usize = 64;

/// Checksum validation failures
#[derive(Error, Debug)]
pub enum ChecksumError {
    /// Validation asset could not be fetched
    #[error("checksum validation failed: checksum could not be downloaded ({version}/{url}): {source}")]
    Download {
        version: String,
        url: String,
        #[source]
        source: RegistryError,
    },

    /// Digest differs
    #[error("checksum validation failed: sha256 mismatch: expected={expected:?}, got={actual:?}")]
    Mismatch { expected: String, actual: String },

    /// Validation asset does not start with a digest
    #[error("checksum validation failed: {reason}")]
    Unreadable { reason: String },
}

/// Lower-case hex SHA256 digest of `data`
pub fn sha256_hex(data: &[u8]) -> String {
    format!("{:x}", Sha256::digest(data))
}

/// Expected digest carried by a validation asset, lower-cased
pub fn expected_digest(validation: &[u8]) -> Result<String, ChecksumError> {
    let prefix = validation
        .get(..DIGEST_HEX_LEN)
        .ok_or_else(|| ChecksumError::Unreadable {
            reason: format!(
                "validation asset holds {} bytes, a sha256 digest needs {}",
                validation.len(),
                DIGEST_HEX_LEN
            ),
        })?;

    if !prefix.iter().all(u8::is_ascii_hexdigit) {
        return Err(ChecksumError::Unreadable {
            reason: "validation asset does not start with a hex sha256 digest".to_string(),
        });
    }

    Ok(String::from_utf8_lossy(prefix).to_ascii_lowercase())
}

/// Check `asset` against the digest in `validation`
pub fn verify(asset: &[u8], validation: &[u8]) -> Result<(), ChecksumError> {
    let expected = expected_digest(validation)?;
    let actual = sha256_hex(asset);

    if actual != expected {
        return Err(ChecksumError::Mismatch { expected, actual });
    }

    Ok(())
}

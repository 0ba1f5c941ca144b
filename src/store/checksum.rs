//! Checksum of persisted documents

use crate::GearError;
use sha2::{Digest, Sha256};

/// Calculate the SHA-256 checksum of a serialized document
///
/// Written next to every saved document so edits made outside the ledger are
/// detected on the next load.
///
/// # Returns
///
/// Returns the hexadecimal SHA-256 hash of `content`
#[must_use]
pub fn calculate_checksum(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    format!("{:x}", hasher.finalize())
}

/// Validate a stored checksum against the one calculated from the current content
///
/// # Errors
///
/// Returns `GearError::ChecksumMismatch` naming `key` if they differ
pub fn validate_checksum(key: &str, stored: &str, current: &str) -> Result<(), GearError> {
    if stored.trim() == current {
        Ok(())
    } else {
        Err(GearError::ChecksumMismatch {
            key: key.to_string(),
            stored: stored.trim().to_string(),
            current: current.to_string(),
        })
    }
}

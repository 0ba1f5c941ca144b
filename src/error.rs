//! Error type shared by the store, configuration and stock operations.
//!
//! The scan and signature reducers never return errors: unresolved references
//! and quantity anomalies degrade to a no-op or a clamped value instead.

use std::fmt;

/// `eventgear` error type
#[derive(Debug)]
pub enum GearError {
    /// Filesystem error while reading or writing a document
    Io(std::io::Error),
    /// Document could not be encoded or decoded as JSON
    Serialization(serde_json::Error),
    /// CSV manifest could not be read or written
    Csv(csv::Error),
    /// Configuration could not be loaded
    Config(String),
    /// Stored document does not match its checksum sidecar
    ChecksumMismatch {
        key: String,
        stored: String,
        current: String,
    },
    /// Another inventory item already carries this barcode
    DuplicateBarcode {
        barcode: String,
        conflicting_id: String,
        conflicting_name: String,
    },
    /// Item still has units out at events
    ItemInUse { item_id: String, in_use: u32 },
    /// No inventory item with this id
    UnknownItem(String),
    /// No event with this id
    UnknownEvent(String),
    /// Other errors
    Other(String),
}

impl fmt::Display for GearError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GearError::Io(e) => write!(f, "I/O error: {e}"),
            GearError::Serialization(e) => write!(f, "Serialization error: {e}"),
            GearError::Csv(e) => write!(f, "CSV error: {e}"),
            GearError::Config(msg) => write!(f, "Configuration error: {msg}"),
            GearError::ChecksumMismatch {
                key,
                stored,
                current,
            } => {
                write!(
                    f,
                    "Document '{key}' was modified outside the ledger.\n\
                     Stored checksum: {stored}\n\
                     Current checksum: {current}"
                )
            }
            GearError::DuplicateBarcode {
                barcode,
                conflicting_id,
                conflicting_name,
            } => {
                write!(
                    f,
                    "Barcode {barcode} is already assigned to '{conflicting_name}' ({conflicting_id})"
                )
            }
            GearError::ItemInUse { item_id, in_use } => {
                write!(
                    f,
                    "Item {item_id} cannot be removed while {in_use} unit(s) are in use"
                )
            }
            GearError::UnknownItem(id) => write!(f, "Unknown inventory item: {id}"),
            GearError::UnknownEvent(id) => write!(f, "Unknown event: {id}"),
            GearError::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for GearError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GearError::Io(e) => Some(e),
            GearError::Serialization(e) => Some(e),
            GearError::Csv(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for GearError {
    fn from(err: std::io::Error) -> Self {
        GearError::Io(err)
    }
}

impl From<serde_json::Error> for GearError {
    fn from(err: serde_json::Error) -> Self {
        GearError::Serialization(err)
    }
}

impl From<csv::Error> for GearError {
    fn from(err: csv::Error) -> Self {
        GearError::Csv(err)
    }
}

impl From<config::ConfigError> for GearError {
    fn from(err: config::ConfigError) -> Self {
        GearError::Config(err.to_string())
    }
}

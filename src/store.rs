//! Persistence of the application document
//!
//! The ledger writes the whole [`AppState`] as one JSON document after every
//! change and normalizes it on every load. Dates are ISO-8601 strings and absent
//! optional fields are written as `null`.

pub mod checksum;
pub mod file;
pub mod manifest;
pub mod memory;

use crate::model::AppState;
use crate::GearError;

pub use file::JsonFileStore;
pub use manifest::{export_inventory, import_receiving, ReceivingLine};
pub use memory::MemoryStore;

/// Whole-document persistence.
pub trait StateStore {
    /// Load the stored document, `None` if nothing has been saved yet.
    ///
    /// # Errors
    ///
    /// Returns `GearError` if the document cannot be read, fails checksum
    /// validation, or is not valid JSON.
    fn load(&self) -> Result<Option<AppState>, GearError>;

    /// Replace the stored document with `state`.
    ///
    /// # Errors
    ///
    /// Returns `GearError` if the document cannot be encoded or written.
    fn save(&mut self, state: &AppState) -> Result<(), GearError>;
}

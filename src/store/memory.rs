//! In-process document store

use crate::model::AppState;
use crate::store::StateStore;
use crate::GearError;
use std::collections::HashMap;

/// Keeps serialized documents in memory, keyed like the file store.
///
/// Documents go through the same JSON encoding as on disk, so legacy documents
/// can be seeded with [`MemoryStore::with_document`] and loaded as the ledger
/// would load them.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    key: String,
    documents: HashMap<String, String>,
}

impl MemoryStore {
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            documents: HashMap::new(),
        }
    }

    /// Seed the raw JSON stored under `key`.
    #[must_use]
    pub fn with_document(mut self, key: impl Into<String>, json: impl Into<String>) -> Self {
        self.documents.insert(key.into(), json.into());
        self
    }

    /// Raw JSON of the current document, if saved.
    #[must_use]
    pub fn raw(&self) -> Option<&str> {
        self.documents.get(&self.key).map(String::as_str)
    }
}

impl StateStore for MemoryStore {
    fn load(&self) -> Result<Option<AppState>, GearError> {
        self.raw()
            .map(serde_json::from_str::<AppState>)
            .transpose()
            .map_err(GearError::from)
    }

    fn save(&mut self, state: &AppState) -> Result<(), GearError> {
        let json = serde_json::to_string(state)?;
        self.documents.insert(self.key.clone(), json);
        Ok(())
    }
}

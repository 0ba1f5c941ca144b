//! JSON document on the local filesystem

use crate::config::GearConfig;
use crate::model::AppState;
use crate::store::checksum::{calculate_checksum, validate_checksum};
use crate::store::StateStore;
use crate::GearError;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

/// Stores the whole state as `<dir>/<key>.json` with a `.sha256` sidecar.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    key: String,
    path: PathBuf,
    verify_checksum: bool,
    pretty: bool,
}

impl JsonFileStore {
    #[must_use]
    pub fn new(dir: impl AsRef<Path>, key: impl Into<String>) -> Self {
        let key = key.into();
        let path = dir.as_ref().join(format!("{key}.json"));
        Self {
            key,
            path,
            verify_checksum: true,
            pretty: false,
        }
    }

    #[must_use]
    pub fn from_config(config: &GearConfig) -> Self {
        Self::new(&config.store_dir, config.document_key.clone())
            .with_checksum_verification(config.verify_checksum)
            .with_pretty(config.pretty)
    }

    #[must_use]
    pub fn with_checksum_verification(mut self, verify: bool) -> Self {
        self.verify_checksum = verify;
        self
    }

    #[must_use]
    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of the checksum sidecar.
    #[must_use]
    pub fn checksum_path(&self) -> PathBuf {
        self.with_suffix(".sha256")
    }

    /// Sidecar written ahead of the document and renamed once the document is in place.
    fn pending_checksum_path(&self) -> PathBuf {
        self.with_suffix(".sha256.tmp")
    }

    fn with_suffix(&self, suffix: &str) -> PathBuf {
        let mut name: OsString = self.path.clone().into_os_string();
        name.push(suffix);
        PathBuf::from(name)
    }

    /// Finish a save interrupted between the two renames: the pending sidecar
    /// matches the document that made it into place.
    fn complete_pending_checksum(&self, current: &str) -> Result<bool, GearError> {
        let pending = self.pending_checksum_path();
        if !pending.exists() || fs::read_to_string(&pending)?.trim() != current {
            return Ok(false);
        }
        log::warn!(
            "completing interrupted save of {}: promoting pending checksum",
            self.path.display()
        );
        fs::rename(&pending, self.checksum_path())?;
        Ok(true)
    }
}

impl StateStore for JsonFileStore {
    fn load(&self) -> Result<Option<AppState>, GearError> {
        if !self.path.exists() {
            log::debug!("no document at {}", self.path.display());
            return Ok(None);
        }
        let content = fs::read(&self.path)?;

        let sidecar = self.checksum_path();
        if self.verify_checksum && sidecar.exists() {
            let stored = fs::read_to_string(&sidecar)?;
            let current = calculate_checksum(&content);
            if let Err(mismatch) = validate_checksum(&self.key, &stored, &current) {
                if !self.complete_pending_checksum(&current)? {
                    return Err(mismatch);
                }
            }
        }

        let state: AppState = serde_json::from_slice(&content)?;
        log::debug!(
            "loaded {} ({} item(s), {} event(s))",
            self.path.display(),
            state.inventory.len(),
            state.events.len()
        );
        Ok(Some(state))
    }

    fn save(&mut self, state: &AppState) -> Result<(), GearError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = if self.pretty {
            serde_json::to_vec_pretty(state)?
        } else {
            serde_json::to_vec(state)?
        };

        // Sidecar staged first; the document rename is the commit point
        let pending = self.pending_checksum_path();
        let tmp = self.with_suffix(".tmp");
        fs::write(&pending, calculate_checksum(&content))?;
        fs::write(&tmp, &content)?;
        fs::rename(&tmp, &self.path)?;
        fs::rename(&pending, self.checksum_path())?;

        log::debug!("saved {} ({} bytes)", self.path.display(), content.len());
        Ok(())
    }
}

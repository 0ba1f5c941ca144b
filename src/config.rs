//! Configuration utilities re-exported at the crate root.
//!
//! This exposes [`GearConfig`] so applications can load settings
//! from `config/config.toml` or environment variables using
//! `GearConfig::load()`.

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;

const CONFIG_FILE: &str = "config/config.toml";
const ENV_PREFIX: &str = "EVENTGEAR";
const SECTION: &str = "eventgear";

fn sources(with_file: bool) -> ConfigBuilder<DefaultState> {
    let builder = Config::builder();
    let builder = if with_file {
        builder.add_source(File::with_name(CONFIG_FILE).required(false))
    } else {
        builder
    };
    builder.add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
}

#[derive(Debug, Clone, Deserialize)]
pub struct GearConfig {
    /// Directory holding persisted documents
    #[serde(default = "default_store_dir")]
    pub store_dir: String,
    /// Key (file stem) of the whole-state document
    #[serde(default = "default_document_key")]
    pub document_key: String,
    /// Verify the SHA-256 sidecar when loading a document
    #[serde(default = "default_verify_checksum")]
    pub verify_checksum: bool,
    /// Pretty-print persisted JSON
    #[serde(default)]
    pub pretty: bool,
    /// Capacity of the remote document feed
    #[serde(default = "default_replication_buffer")]
    pub replication_buffer: usize,
}

fn default_store_dir() -> String {
    "data".to_string()
}

fn default_document_key() -> String {
    "app_state".to_string()
}

fn default_verify_checksum() -> bool {
    true
}

fn default_replication_buffer() -> usize {
    64
}

impl Default for GearConfig {
    fn default() -> Self {
        Self {
            store_dir: default_store_dir(),
            document_key: default_document_key(),
            verify_checksum: default_verify_checksum(),
            pretty: false,
            replication_buffer: default_replication_buffer(),
        }
    }
}

impl GearConfig {
    /// Load the `[eventgear]` section of `config/config.toml`, overridden by
    /// `EVENTGEAR__*` environment variables.
    ///
    /// A file that cannot be parsed is skipped with a warning; a missing
    /// section yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the environment alone cannot be read or the
    /// section holds values of the wrong type.
    pub fn load() -> Result<Self, ConfigError> {
        let settings = match sources(true).build() {
            Ok(settings) => settings,
            Err(file_err) => {
                log::warn!("skipping {CONFIG_FILE}: {file_err}");
                sources(false).build()?
            }
        };
        Self::from_settings(&settings)
    }

    fn from_settings(settings: &Config) -> Result<Self, ConfigError> {
        match settings.get::<GearConfig>(SECTION) {
            Err(ConfigError::NotFound(_)) => Ok(GearConfig::default()),
            section => section,
        }
    }

    /// Path of the whole-state document.
    #[must_use]
    pub fn document_path(&self) -> PathBuf {
        PathBuf::from(&self.store_dir).join(format!("{}.json", self.document_key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_data_dir() {
        let cfg = GearConfig::default();
        assert_eq!(cfg.document_path(), PathBuf::from("data").join("app_state.json"));
        assert!(cfg.verify_checksum);
        assert_eq!(cfg.replication_buffer, 64);
    }

    #[test]
    fn partial_section_fills_defaults() {
        let settings = Config::builder()
            .set_override("eventgear.store_dir", "/tmp/gear")
            .and_then(|b| b.set_override("eventgear.pretty", true))
            .expect("override")
            .build()
            .expect("build");
        let cfg: GearConfig = settings.get("eventgear").expect("section");
        assert_eq!(cfg.store_dir, "/tmp/gear");
        assert!(cfg.pretty);
        assert_eq!(cfg.document_key, "app_state");
    }

    #[test]
    fn missing_section_means_defaults() {
        let settings = Config::builder()
            .set_override("other.key", 1)
            .expect("override")
            .build()
            .expect("build");
        let cfg = GearConfig::from_settings(&settings).expect("defaults");
        assert_eq!(cfg.store_dir, "data");
        assert_eq!(cfg.replication_buffer, 64);
    }
}

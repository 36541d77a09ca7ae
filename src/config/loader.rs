//! Settings Loader
//!
//! Layers an optional settings file under `TAXON__*` environment overrides.
//! Nested keys are separated by `__`, so `TAXON__CHAIN__ORDERING=pairwise`
//! sets `chain.ordering`.

use super::{Settings, SettingsError};
use config::{Config, Environment, File};
use std::path::Path;
use tracing::debug;

/// Default settings file stem, resolved against the working directory
pub const DEFAULT_SETTINGS_FILE: &str = "taxon";

/// Environment variable prefix
pub const ENV_PREFIX: &str = "TAXON";

pub struct SettingsLoader;

impl SettingsLoader {
    /// Load `taxon.{toml,yaml,json}` if present plus environment overrides.
    pub fn load() -> Result<Settings, SettingsError> {
        Self::build(File::with_name(DEFAULT_SETTINGS_FILE).required(false))
    }

    /// Load a specific settings file plus environment overrides. The file must exist.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Settings, SettingsError> {
        let path = path.as_ref();
        debug!(path = %path.display(), "Loading settings file");
        Self::build(File::from(path).required(true))
    }

    fn build<S>(file: S) -> Result<Settings, SettingsError>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let settings: Settings = Config::builder()
            .add_source(file)
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        settings.validate()?;

        debug!(
            ordering = ?settings.chain.ordering,
            log_level = ?settings.logging.level,
            json = settings.logging.json,
            "Settings loaded"
        );
        Ok(settings)
    }
}

//! # Configuration System
//!
//! Settings that control chain construction and logging. Registries and chains
//! are built by the embedding application; these settings only select among the
//! behaviors the library offers.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use taxon_core::config::SettingsLoader;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Reads taxon.{toml,yaml,json} if present, then TAXON__* environment overrides
//! let settings = SettingsLoader::load()?;
//! println!("chain ordering: {:?}", settings.chain.ordering);
//! # Ok(())
//! # }
//! ```

pub mod loader;

use crate::translation::ChainOrdering;
use serde::{Deserialize, Serialize};

pub use loader::SettingsLoader;

/// Log levels accepted by [`LoggingSettings::level`]
pub const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error", "off"];

/// Root settings structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Translation chain construction
    pub chain: ChainSettings,

    /// Subscriber installed by [`crate::logging::init_with_settings`]
    pub logging: LoggingSettings,
}

impl Settings {
    /// Check values serde cannot check on its own.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if let Some(level) = &self.logging.level {
            if !LOG_LEVELS.contains(&level.to_lowercase().as_str()) {
                return Err(SettingsError::invalid_value(
                    "logging.level",
                    level,
                    format!("expected one of {}", LOG_LEVELS.join(", ")),
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ChainSettings {
    pub ordering: ChainOrdering,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Filter directive; when unset the level follows the detected environment
    pub level: Option<String>,

    /// Emit JSON lines instead of human readable output
    pub json: bool,
}

/// Settings loading errors
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Failed to load settings: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid value for '{field}': '{value}' ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

impl SettingsError {
    pub fn invalid_value(
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }
}

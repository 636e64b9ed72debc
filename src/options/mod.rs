//! Picking options with TOML preset support.
//!
//! Options serialize to/from TOML so hosts can ship presets next to their
//! other renderer settings.

mod debug;
mod select;

use std::path::Path;

pub use debug::DebugOptions;
use schemars::JsonSchema;
pub use select::SelectOptions;
use serde::{Deserialize, Serialize};

use crate::error::SelectError;

/// Top-level options container. All sub-structs use `#[serde(default)]` so
/// partial TOML files (e.g. only overriding `[select]`) work correctly.
#[derive(
    Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default, JsonSchema,
)]
#[serde(default)]
pub struct Options {
    /// Hit buffer and query pool sizing.
    pub select: SelectOptions,
    /// Debugging aids.
    pub debug: DebugOptions,
}

impl Options {
    /// Generate JSON Schema describing the UI-exposed options.
    #[must_use]
    pub fn json_schema() -> schemars::Schema {
        schemars::schema_for!(Options)
    }

    /// Load options from a TOML file. Missing fields use defaults.
    ///
    /// # Errors
    ///
    /// Returns `SelectError::Io` or `SelectError::OptionsParse`.
    pub fn load(path: &Path) -> Result<Self, SelectError> {
        let content = std::fs::read_to_string(path).map_err(SelectError::Io)?;
        Self::from_toml(&content)
    }

    /// Parse options from TOML text. Missing fields use defaults.
    ///
    /// # Errors
    ///
    /// Returns `SelectError::OptionsParse` on malformed input.
    pub fn from_toml(content: &str) -> Result<Self, SelectError> {
        toml::from_str(content)
            .map_err(|e| SelectError::OptionsParse(e.to_string()))
    }

    /// Save options to a TOML file (pretty-printed).
    ///
    /// # Errors
    ///
    /// Returns `SelectError::Io` or `SelectError::OptionsParse`.
    pub fn save(&self, path: &Path) -> Result<(), SelectError> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| SelectError::OptionsParse(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(SelectError::Io)?;
        }
        std::fs::write(path, content).map_err(SelectError::Io)
    }
}

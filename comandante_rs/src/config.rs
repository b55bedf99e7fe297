//! Dispatch configuration.
//!
//! Optional `.comandante.toml` next to the program (or anywhere the caller
//! points at). Every field has a default, so an empty file is valid.

use serde::Deserialize;
use std::path::Path;
use tracing::warn;

/// File name looked up by [`DispatchConfig::load`].
pub const CONFIG_FILE_NAME: &str = ".comandante.toml";

/// Default maximum edit distance for "did you mean" suggestions.
pub const DEFAULT_SUGGESTION_DISTANCE: usize = 2;

/// How forgiving the dispatcher is about bad input.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Strict mode turns an unknown command into an error and aborts on
    /// flag-parse failures. Lenient mode (the default) prints the default
    /// help for unknown commands and logs flag errors, then runs the action.
    pub strict: bool,
    /// Maximum Levenshtein distance for suggesting a registered command when
    /// an unknown one is requested. `0` disables suggestions.
    pub suggestion_distance: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            strict: false,
            suggestion_distance: DEFAULT_SUGGESTION_DISTANCE,
        }
    }
}

impl DispatchConfig {
    /// Strict configuration with default suggestions.
    pub fn strict() -> Self {
        Self {
            strict: true,
            ..Self::default()
        }
    }

    /// Load config from `.comandante.toml` in the given directory.
    /// Returns default config if the file doesn't exist or is invalid.
    pub fn load(root: &Path) -> Self {
        Self::load_from_path(&root.join(CONFIG_FILE_NAME))
    }

    /// Load config from a specific path.
    pub fn load_from_path(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => match Self::from_toml_str(&content) {
                Ok(config) => config,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to parse config");
                    Self::default()
                }
            },
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to read config");
                Self::default()
            }
        }
    }

    /// Parse config from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

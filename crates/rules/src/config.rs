//! Rules configuration.
//!
//! Loaded from TOML so the tile supply, history depth and remote-fallback
//! policy can change without code changes. Every field has a default.
//!
//! ```
//! use azul_rules::RulesConfig;
//!
//! let config = RulesConfig::from_toml_str(r#"
//!     history_capacity = 25
//!     assume_valid_on_remote_error = true
//! "#).unwrap();
//!
//! assert_eq!(config.tiles_per_color, 20);
//! assert_eq!(config.history_capacity, 25);
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{DEFAULT_HISTORY_CAPACITY, TILES_PER_COLOR};

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct RulesConfig {
    /// Physical tiles of each color in the game box
    pub tiles_per_color: u8,

    /// Snapshots kept on each of the undo and redo stacks
    pub history_capacity: usize,

    /// Treat an unreachable or failing analysis engine as confirmation.
    /// Off by default: remote failures are reported to the caller.
    pub assume_valid_on_remote_error: bool,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            tiles_per_color: TILES_PER_COLOR,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            assume_valid_on_remote_error: false,
        }
    }
}

impl RulesConfig {
    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns error if the file can't be read, holds invalid TOML, or fails validation.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: RulesConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tiles_per_color == 0 {
            return Err(ConfigError::Invalid(
                "tiles_per_color must be at least 1".to_string(),
            ));
        }
        if self.history_capacity == 0 {
            return Err(ConfigError::Invalid(
                "history_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

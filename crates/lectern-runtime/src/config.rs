//! Runtime configuration file management.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Result, RuntimeError};

/// Complete workbench runtime configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Database settings.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Workbench behavior settings.
    #[serde(default)]
    pub workbench: WorkbenchConfig,
}

/// Database configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// State database path. Empty = in-memory.
    #[serde(default)]
    pub path: String,
}

/// Workbench behavior configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkbenchConfig {
    /// User id attached to user-scoped field access by default.
    #[serde(default)]
    pub default_user_id: Option<String>,
    /// Wipe all stored state when scenarios are (re)initialized, instead of
    /// only the children-scoped rows.
    #[serde(default = "default_true")]
    pub reset_state_on_start: bool,
}

impl Default for WorkbenchConfig {
    fn default() -> Self {
        WorkbenchConfig {
            default_user_id: None,
            reset_state_on_start: true,
        }
    }
}

fn default_true() -> bool {
    true
}

impl RuntimeConfig {
    /// Parse a configuration from TOML text.
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| RuntimeError::Config(e.to_string()))
    }

    /// Load a configuration file, or fall back to defaults if it does not
    /// exist.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(text) => Self::from_toml(&text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(RuntimeError::Config(e.to_string())),
        }
    }
}

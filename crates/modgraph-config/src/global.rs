//! Global Configuration (~/.modgraph/config.toml)
//!
//! Handles user-level defaults stored in `~/.modgraph/config.toml`.

use crate::project::OutputFormat;
use crate::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Global user configuration from ~/.modgraph/config.toml
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct GlobalConfig {
    /// Default settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defaults: Option<DefaultsConfig>,
}

/// Default settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct DefaultsConfig {
    /// Cross-group friend limit when the project sets none
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_friends: Option<usize>,

    /// Report format when an output does not name one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<OutputFormat>,
}

impl GlobalConfig {
    /// Load global configuration from a file
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound(path.to_path_buf())
            } else {
                ConfigError::IoError(e)
            }
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::TomlParseError {
            file: path.to_path_buf(),
            error: e,
        })
    }

    /// Get the global config file path (~/.modgraph/config.toml)
    pub fn global_config_path() -> ConfigResult<PathBuf> {
        let home = dirs::home_dir().ok_or(ConfigError::HomeNotFound)?;
        Ok(home.join(".modgraph").join("config.toml"))
    }

    pub fn default_max_friends(&self) -> Option<usize> {
        self.defaults.as_ref().and_then(|d| d.max_friends)
    }

    pub fn default_format(&self) -> Option<OutputFormat> {
        self.defaults.as_ref().and_then(|d| d.format)
    }

    /// Merge another global config into this one
    /// Other config takes precedence for non-None values
    pub fn merge(&mut self, other: &GlobalConfig) {
        let Some(theirs) = &other.defaults else {
            return;
        };
        let ours = self.defaults.get_or_insert_with(DefaultsConfig::default);
        if theirs.max_friends.is_some() {
            ours.max_friends = theirs.max_friends;
        }
        if theirs.format.is_some() {
            ours.format = theirs.format;
        }
    }
}

//! Configuration management for pluginmaster.
//!
//! Handles loading configuration from TOML files. Every setting has a
//! default, so running without any config file uses the standard layout.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::index::INDEX_FILE;
use crate::integrations::DEFAULT_API_BASE;

/// Name of the config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "pluginmaster.toml";

/// Owner of the plugin release repositories.
pub const DEFAULT_OWNER: &str = "SHOEGAZEssb";

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Input and output locations
    pub paths: PathsConfig,

    /// Release API settings
    pub releases: ReleasesConfig,
}

/// Filesystem locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory holding one subdirectory per plugin
    pub plugins_dir: PathBuf,

    /// Index file, read as the previous state and overwritten with the new one
    pub index_path: PathBuf,
}

/// Release API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReleasesConfig {
    /// API base URL
    pub api_base: String,

    /// Owner of every plugin's release repository
    pub owner: String,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self { plugins_dir: PathBuf::from("plugins"), index_path: PathBuf::from(INDEX_FILE) }
    }
}

impl Default for ReleasesConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            owner: DEFAULT_OWNER.to_string(),
            timeout_secs: 30,
        }
    }
}

impl ReleasesConfig {
    /// Request timeout as a duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Looks for config in:
    /// 1. `pluginmaster.toml` in current directory
    /// 2. `~/.config/pluginmaster/config.toml`
    /// 3. Falls back to defaults
    pub fn load() -> anyhow::Result<Self> {
        let local_config = PathBuf::from(LOCAL_CONFIG_FILE);
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        if let Some(config_dir) = Self::config_dir() {
            let global_config = config_dir.join("config.toml");
            if global_config.exists() {
                return Self::load_from_file(&global_config);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from an explicit path, or the default location.
    pub fn resolve(explicit: Option<&Path>) -> anyhow::Result<Self> {
        match explicit {
            Some(path) => Self::load_from_file(path),
            None => Self::load(),
        }
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Invalid config {}", path.display()))?;
        Ok(config)
    }

    /// Get the global config directory path.
    pub fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("pluginmaster"))
    }
}

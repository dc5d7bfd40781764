//! Configuration file loading and management
//!
//! This module handles loading and parsing the host configuration from
//! `$XDG_CONFIG_HOME/lyyti/config.toml`. If the configuration file doesn't
//! exist, a default configuration is created with documented comments.
//!
//! Plugin settings (API keys, default event, cache lifetime) are not part of
//! this file; they live in the option store and are edited with
//! `lyyti-cli settings set`.

use anyhow::{Context, Result};
use provider_lyyti::LyytiConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main host configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Host configuration
    #[serde(default)]
    pub host: HostConfig,
    /// Lyyti plugin deployment configuration
    #[serde(default)]
    pub lyyti: LyytiConfig,
}

/// Host configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HostConfig {
    /// Log level (trace, debug, info, warn, error)
    /// Default: "warn"
    pub log_level: String,
    /// Path to the store database (SQLite)
    /// If None, uses XDG_DATA_HOME/lyyti/store.db
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_path: Option<PathBuf>,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            store_path: None,
        }
    }
}

fn project_dirs() -> Result<directories::ProjectDirs> {
    directories::ProjectDirs::from("", "", "lyyti").context("Failed to determine project directories")
}

impl Config {
    /// Load configuration from the specified path
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from the default XDG config location
    ///
    /// If the configuration file doesn't exist, creates a default configuration
    /// file with documented comments.
    pub fn load_default() -> Result<Self> {
        let config_path = Self::default_config_path()?;

        if !config_path.exists() {
            Self::create_default_file(&config_path)?;
        }

        Self::load(&config_path)
    }

    /// Get the default configuration file path
    ///
    /// Returns `$XDG_CONFIG_HOME/lyyti/config.toml`
    pub fn default_config_path() -> Result<PathBuf> {
        Ok(project_dirs()?.config_dir().join("config.toml"))
    }

    /// Create a default configuration file with documented comments
    pub fn create_default_file(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        fs::write(path, Self::default_config_content())
            .with_context(|| format!("Failed to write default config file: {}", path.display()))?;

        tracing::info!("Created default configuration file at: {}", path.display());
        Ok(())
    }

    /// Generate the default configuration file content with comments
    fn default_config_content() -> String {
        r#"# Lyyti Participant Counts Configuration
# This file configures the lyyti-cli host.
#
# Plugin settings (API keys, default event id, status filter and cache
# lifetime) are stored in the host database. Use `lyyti-cli settings set`
# to change them.

[host]
# Log level: trace, debug, info, warn, error
# Overridden by RUST_LOG when set.
# Default: "warn"
log_level = "warn"

# Path to the SQLite store holding settings and cached counts
# If not specified, defaults to $XDG_DATA_HOME/lyyti/store.db
# store_path = "/path/to/store.db"

[lyyti]
# Root of the Lyyti API
# Default: "https://api.lyyti.com/v2/"
api_base_url = "https://api.lyyti.com/v2/"
"#
        .to_string()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&self.host.log_level.as_str()) {
            anyhow::bail!(
                "Invalid log_level: {}. Must be one of: {}",
                self.host.log_level,
                valid_log_levels.join(", ")
            );
        }

        let url = reqwest::Url::parse(&self.lyyti.api_base_url)
            .with_context(|| format!("Invalid api_base_url: {}", self.lyyti.api_base_url))?;
        if !matches!(url.scheme(), "http" | "https") {
            anyhow::bail!(
                "Invalid api_base_url: {}. Must be an http or https URL",
                self.lyyti.api_base_url
            );
        }

        Ok(())
    }

    /// Get the store database path
    ///
    /// Returns the configured store path or the default XDG data directory path
    pub fn store_path(&self) -> Result<PathBuf> {
        if let Some(ref path) = self.host.store_path {
            return Ok(path.clone());
        }

        Ok(project_dirs()?.data_dir().join("store.db"))
    }
}

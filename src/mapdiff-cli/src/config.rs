//! Configuration management for mapdiff

use crate::cli::OutputFormat;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Default, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub format: Option<OutputFormat>,
    pub label_threshold_mb: Option<u64>,
}

impl Config {
    /// Get the path to the config file
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?
            .join("mapdiff");

        Ok(config_dir.join("config.toml"))
    }

    /// Load configuration from the default location, or defaults if absent
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Ok(path) => Self::load_from(&path),
            Err(e) => {
                tracing::debug!("{e:#}, using default configuration");
                Ok(Config::default())
            }
        }
    }

    /// Load configuration from `path`, or defaults if it doesn't exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Format from the command line, then config, then text
    pub fn resolve_format(&self, flag: Option<OutputFormat>) -> OutputFormat {
        flag.or(self.format).unwrap_or_default()
    }

    /// Per-label cutoff in bytes
    pub fn resolve_threshold(&self, flag_mb: Option<u64>) -> u64 {
        flag_mb
            .or(self.label_threshold_mb)
            .map(|mb| mb.saturating_mul(mapdiff::MEGABYTE))
            .unwrap_or(mapdiff::DEFAULT_LABEL_THRESHOLD)
    }
}

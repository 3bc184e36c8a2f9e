//! Configuration for descriptor generation
//!
//! Settings live in a small TOML file. `PLUGDESC_CONFIG` overrides the
//! location, otherwise it is `~/.config/plugdesc/plugdesc.toml` (the
//! platform config dir on Windows). A missing file means all defaults.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable that points at an alternative config file
pub const CONFIG_ENV: &str = "PLUGDESC_CONFIG";

const CONFIG_FILE: &str = "plugdesc.toml";

/// Keys accepted by `get`/`set`, in display order
pub const KNOWN_KEYS: &[&str] = &["output-dir", "artifact-name", "default-version", "tool-id"];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Unknown config key: {0}. Supported keys: output-dir, artifact-name, default-version, tool-id")]
    UnknownKey(String),

    #[error("Could not determine config directory")]
    NoConfigDir,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_id: Option<String>,
}

impl Config {
    /// Resolve the config file location
    pub fn path() -> Result<PathBuf, ConfigError> {
        if let Ok(env_path) = std::env::var(CONFIG_ENV) {
            let trimmed = env_path.trim();
            if !trimmed.is_empty() {
                return Ok(PathBuf::from(trimmed));
            }
        }
        Ok(config_dir()?.join(CONFIG_FILE))
    }

    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path(&Self::path()?)
    }

    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to_path(&Self::path()?)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "output-dir" => self.output_dir.clone(),
            "artifact-name" => self.artifact_name.clone(),
            "default-version" => self.default_version.clone(),
            "tool-id" => self.tool_id.clone(),
            _ => None,
        }
    }

    pub fn set(&mut self, key: &str, value: String) -> Result<(), ConfigError> {
        match key {
            "output-dir" => self.output_dir = Some(value),
            "artifact-name" => self.artifact_name = Some(value),
            "default-version" => self.default_version = Some(value),
            "tool-id" => self.tool_id = Some(value),
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.output_dir.is_none()
            && self.artifact_name.is_none()
            && self.default_version.is_none()
            && self.tool_id.is_none()
    }

    /// Set keys with their values, in `KNOWN_KEYS` order
    pub fn values_iter(&self) -> Vec<(&'static str, String)> {
        KNOWN_KEYS
            .iter()
            .filter_map(|key| self.get(key).map(|value| (*key, value)))
            .collect()
    }
}

/// Directory holding the config file and the log file
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    #[cfg(not(target_os = "windows"))]
    let dir = dirs::home_dir()
        .ok_or(ConfigError::NoConfigDir)?
        .join(".config")
        .join("plugdesc");

    #[cfg(target_os = "windows")]
    let dir = dirs::config_dir()
        .ok_or(ConfigError::NoConfigDir)?
        .join("plugdesc");

    Ok(dir)
}

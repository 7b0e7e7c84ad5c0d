//! Service configuration.
//!
//! Read from an optional TOML file, then overridden by environment variables.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::info;

/// Config file read when `QUEST_CONFIG` is unset
pub const DEFAULT_CONFIG_FILE: &str = "quest-service.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid value '{value}' for {key}")]
    InvalidEnv { key: &'static str, value: String },
    #[error("base_path '{0}' must be empty or start with '/'")]
    InvalidBasePath(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Root of the exported quest documents
    pub data_dir: PathBuf,
    pub bind_addr: String,
    /// Prefix of the quest routes
    pub base_path: String,
    /// Rebuild the catalog when documents change
    pub hot_reload: bool,
    /// Default tracing directive, extended by `RUST_LOG`
    pub log_filter: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            bind_addr: "0.0.0.0:8080".to_string(),
            base_path: "/ms/quest".to_string(),
            hot_reload: false,
            log_filter: "quest_service=info".to_string(),
        }
    }
}

impl ServiceConfig {
    /// Load from the process environment
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("QUEST_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        let mut config = Self::from_file(Path::new(&path))?;
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the router cannot mount
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.base_path.is_empty() && !self.base_path.starts_with('/') {
            return Err(ConfigError::InvalidBasePath(self.base_path.clone()));
        }
        Ok(())
    }

    /// Defaults when the file does not exist
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        info!("Reading config from {:?}", path);
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Apply `WZ_DIR`, `QUEST_BIND_ADDR` and `QUEST_HOT_RELOAD` from `lookup`
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup("WZ_DIR") {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(addr) = lookup("QUEST_BIND_ADDR") {
            self.bind_addr = addr;
        }
        if let Some(value) = lookup("QUEST_HOT_RELOAD") {
            self.hot_reload = match value.to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => {
                    return Err(ConfigError::InvalidEnv {
                        key: "QUEST_HOT_RELOAD",
                        value,
                    });
                }
            };
        }
        Ok(())
    }
}

//! Configuration module for lazypipe-rs
//!
//! This module handles engine configuration:
//! - Execution settings applied to new graphs (default mode, node timings)
//! - Logging settings consumed by [`crate::logging::init`]
//!
//! # Config Location
//!
//! The default configuration file lives in the platform-appropriate location:
//! - **Linux**: `~/.config/dev.hxyulin.lazypipe-rs/config.toml`
//! - **macOS**: `~/Library/Application Support/dev.hxyulin.lazypipe-rs/config.toml`
//! - **Windows**: `%APPDATA%\dev.hxyulin.lazypipe-rs\config.toml`
//!
//! # Example
//!
//! ```ignore
//! use lazypipe_rs::config::EngineConfig;
//! use lazypipe_rs::Graph;
//!
//! let config = EngineConfig::load_or_default();
//! lazypipe_rs::logging::init(&config.logging)?;
//! let mut graph = Graph::with_config(&config.execution);
//! ```

pub mod settings;

pub use settings::*;

use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application identifier for config directories
pub const APP_ID: &str = "dev.hxyulin.lazypipe-rs";

/// Config filename
pub const CONFIG_FILE: &str = "config.toml";

/// Get the path of the default config file
pub fn default_path() -> Option<PathBuf> {
    dirs_next::config_dir().map(|p| p.join(APP_ID).join(CONFIG_FILE))
}

/// Complete engine configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Settings applied to graphs built with [`Graph::with_config`](crate::Graph::with_config)
    #[serde(default)]
    pub execution: ExecutionSettings,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingSettings,
}

impl EngineConfig {
    /// Parse a configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| PipelineError::Config(format!("Failed to parse config: {}", e)))
    }

    /// Serialize the configuration to TOML text
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| PipelineError::Config(format!("Failed to serialize config: {}", e)))
    }

    /// Load a configuration file from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            PipelineError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;
        Self::from_toml_str(&content)
    }

    /// Load the default config file, returning defaults if it is missing or invalid
    pub fn load_or_default() -> Self {
        let Some(path) = default_path() else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        Self::load(&path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Save the configuration to disk as TOML
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                PipelineError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        std::fs::write(path, self.to_toml_string()?).map_err(|e| {
            PipelineError::Config(format!("Failed to write config file {:?}: {}", path, e))
        })
    }
}

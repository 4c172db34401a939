//! Configuration file handling for glyphcam.
//!
//! Loads configuration from `<config dir>/glyphcam/config.toml` or a custom path.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::ascii::Effect;
use crate::engine::{RenderRequest, Tuning};

/// Configuration file structure for glyphcam.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub tuning: Tuning,
    #[serde(default)]
    pub font: FontConfig,
}

/// Default per-frame settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub effect: Effect,
    pub detail: u8,
    pub jitter: u8,
    pub softness: u8,
    pub width: u32,
    pub height: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        let req = RenderRequest::default();
        Self {
            effect: req.effect,
            detail: req.detail,
            jitter: req.jitter,
            softness: req.softness,
            width: req.output_width_px,
            height: req.output_height_px,
        }
    }
}

impl From<RenderConfig> for RenderRequest {
    fn from(c: RenderConfig) -> Self {
        RenderRequest {
            effect: c.effect,
            detail: c.detail.min(100),
            jitter: c.jitter.min(100),
            softness: c.softness.min(100),
            output_width_px: c.width,
            output_height_px: c.height,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FontConfig {
    /// TrueType/OpenType font used for metrics and bitmap output
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Errors that can occur when loading or writing configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{}': {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Config file '{}' not found", .path.display())]
    NotFound { path: PathBuf },

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

impl Config {
    /// Load configuration from the default path.
    /// Returns default config if the file doesn't exist.
    /// Returns an error if the file exists but cannot be parsed.
    pub fn load() -> Result<Self, ConfigError> {
        let path = default_path();
        if path.exists() {
            Self::read(&path)
        } else {
            log::debug!("No config at {}; using defaults", path.display());
            Ok(Config::default())
        }
    }

    /// Load configuration from an explicit path, which must exist.
    pub fn load_from_explicit(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }
        Self::read(path)
    }

    fn read(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Render this configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Write this configuration to `path`, creating parent directories.
    pub fn write(&self, path: &Path) -> Result<(), ConfigError> {
        let content = self.to_toml()?;
        let io_err = |e: std::io::Error| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        std::fs::write(path, content).map_err(io_err)
    }
}

/// Get the default config file path.
pub fn default_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("glyphcam").join("config.toml"))
        .unwrap_or_else(|| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".config/glyphcam/config.toml")
        })
}

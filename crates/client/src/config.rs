//! Configuration management for the PandaTools client.
//!
//! Settings live in a TOML file, by default `~/.config/pandatools/config.toml`.
//! Every section is optional; missing keys fall back to the built-in defaults.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default processing service endpoint.
pub const DEFAULT_API_BASE: &str = "https://pdf-tools-backend-1.onrender.com";

/// Default number of gallery items rendered per frame.
pub const DEFAULT_BATCH_SIZE: usize = 20;

/// Default minimum touch displacement (in pixels) before a touch reorders.
pub const DEFAULT_TOUCH_THRESHOLD: f32 = 10.0;

/// Overrides `[service] base_url`.
pub const ENV_API_BASE: &str = "PANDATOOLS_API_BASE";

/// Overrides `[general] log_level`.
pub const ENV_LOG_LEVEL: &str = "PANDATOOLS_LOG_LEVEL";

/// A configuration value outside its accepted range.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("base_url must be an http:// or https:// URL, got {0}")]
    InvalidBaseUrl(String),

    #[error("timeout_secs must be between 1 and 3600 seconds, got {0}")]
    InvalidTimeout(u64),

    #[error("batch_size must be between 1 and 1000, got {0}")]
    InvalidBatchSize(usize),

    #[error("touch_threshold must be a positive number of pixels, got {0}")]
    InvalidTouchThreshold(f32),

    #[error("log_level {0:?} is not one of trace, debug, info, warn, error")]
    InvalidLogLevel(String),
}

/// Levels accepted by the log filter.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Main configuration structure for the PandaTools client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    /// General client configuration.
    pub general: GeneralConfig,

    /// Remote processing service.
    pub service: ServiceConfig,

    /// Preview gallery behaviour.
    pub gallery: GalleryConfig,

    /// Artifact delivery.
    pub download: DownloadConfig,
}

/// General client configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GeneralConfig {
    /// Default log filter level when `RUST_LOG` is unset.
    pub log_level: String,
}

/// Remote processing service configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServiceConfig {
    /// Base URL; each tool is posted to `{base_url}/{tool}`.
    pub base_url: String,

    /// Overall request timeout in seconds.
    pub timeout_secs: u64,
}

/// Preview gallery configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GalleryConfig {
    /// Items rendered per frame.
    pub batch_size: usize,

    /// Minimum touch displacement in pixels before a touch becomes a reorder.
    pub touch_threshold: f32,
}

/// Artifact delivery configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DownloadConfig {
    /// Directory artifacts are saved into.
    pub output_dir: PathBuf,

    /// Save the artifact as soon as it arrives.
    pub auto_download: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE.to_string(),
            timeout_secs: 300, // 5 minutes
        }
    }
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            touch_threshold: DEFAULT_TOUCH_THRESHOLD,
        }
    }
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            auto_download: true,
        }
    }
}

impl ServiceConfig {
    /// Request timeout as a duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// `<config dir>/pandatools/config.toml`, or a relative path when the
/// platform has no config directory.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("pandatools")
        .join("config.toml")
}

impl Config {
    /// Overlays `PANDATOOLS_API_BASE` and `PANDATOOLS_LOG_LEVEL` on top of
    /// the file values. Empty variables are ignored.
    ///
    /// Returns the applied variables and their values for the caller to log.
    pub fn apply_env_overrides(&mut self) -> Vec<(&'static str, String)> {
        let mut applied = Vec::new();

        if let Ok(url) = std::env::var(ENV_API_BASE) {
            if !url.is_empty() {
                self.service.base_url = url.clone();
                applied.push((ENV_API_BASE, url));
            }
        }

        if let Ok(level) = std::env::var(ENV_LOG_LEVEL) {
            if !level.is_empty() {
                self.general.log_level = level.clone();
                applied.push((ENV_LOG_LEVEL, level));
            }
        }

        applied
    }

    /// Checks every value against its accepted range, reporting the first
    /// one that is out of bounds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let base = &self.service.base_url;
        match url::Url::parse(base) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {}
            _ => return Err(ConfigError::InvalidBaseUrl(base.clone())),
        }

        if self.service.timeout_secs < 1 || self.service.timeout_secs > 3600 {
            return Err(ConfigError::InvalidTimeout(self.service.timeout_secs));
        }

        if self.gallery.batch_size < 1 || self.gallery.batch_size > 1000 {
            return Err(ConfigError::InvalidBatchSize(self.gallery.batch_size));
        }

        // NaN fails this comparison too
        if !(self.gallery.touch_threshold > 0.0) {
            return Err(ConfigError::InvalidTouchThreshold(
                self.gallery.touch_threshold,
            ));
        }

        let level = self.general.log_level.to_lowercase();
        if !VALID_LOG_LEVELS.contains(&level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(self.general.log_level.clone()));
        }
        Ok(())
    }

    /// Reads the file at `path`; a missing file yields the defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Cannot read {}", path.display()))?;
        Self::from_toml(&contents).with_context(|| format!("Bad config in {}", path.display()))
    }

    pub fn load_default() -> Result<Self> {
        Self::load(default_config_path())
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| anyhow::anyhow!("TOML error: {}", describe_toml_error(&e)))
    }

    /// Writes the configuration to `path`, creating missing directories.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Cannot create {}", dir.display()))?;
        }

        fs::write(path, self.to_toml()?)
            .with_context(|| format!("Cannot write {}", path.display()))?;
        tracing::debug!(path = %path.display(), "Config saved");
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Cannot serialize config")
    }
}

/// The parser message plus the byte range it points at, if any.
fn describe_toml_error(error: &toml::de::Error) -> String {
    match error.span() {
        Some(span) => format!("{} (bytes {}..{})", error.message(), span.start, span.end),
        None => error.message().to_string(),
    }
}

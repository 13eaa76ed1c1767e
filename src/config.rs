// src/config.rs

use crate::access::{TierPolicy, DEFAULT_PREMIUM_QUALITIES};
use crate::checkout::PremiumOffer;
use crate::error::AppError;
use dirs_next as dirs;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://localhost:3001";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// The structure of the configuration file (config.toml)
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Base address of the metadata and payment backend
    pub api_url: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// Quality labels that require a purchase
    pub premium_qualities: Vec<String>,
    /// Where downloaded files are saved
    pub output_dir: PathBuf,
    pub offer: PremiumOffer,
}

impl Default for Config {
    fn default() -> Self {
        let output_dir = dirs::download_dir().unwrap_or_else(|| PathBuf::from("downloads"));

        Config {
            api_url: DEFAULT_API_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            premium_qualities: DEFAULT_PREMIUM_QUALITIES
                .iter()
                .map(|q| q.to_string())
                .collect(),
            output_dir,
            offer: PremiumOffer::default(),
        }
    }
}

impl Config {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn tier_policy(&self) -> TierPolicy {
        TierPolicy::new(self.premium_qualities.iter().cloned())
    }

    /// Parse a config file body; missing keys keep their defaults
    pub fn from_toml_str(content: &str) -> Result<Self, AppError> {
        let config: Config = toml::from_str(content)?;
        config.validated()
    }

    /// Apply `TIERLOAD_*` overrides from the given variable lookup
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("TIERLOAD_API_URL") {
            debug!("api_url overridden from environment");
            self.api_url = url;
        }
        if let Some(raw) = lookup("TIERLOAD_TIMEOUT_SECS") {
            self.timeout_secs = raw.trim().parse().map_err(|_| {
                AppError::ConfigError(format!("TIERLOAD_TIMEOUT_SECS is not a number: {}", raw))
            })?;
        }
        if let Some(dir) = lookup("TIERLOAD_OUTPUT_DIR") {
            self.output_dir = PathBuf::from(dir);
        }
        Ok(())
    }

    fn validated(self) -> Result<Self, AppError> {
        if self.api_url.trim().is_empty() {
            return Err(AppError::ConfigError("api_url cannot be empty".to_string()));
        }
        if self.timeout_secs == 0 {
            return Err(AppError::ConfigError(
                "timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(self)
    }
}

/// Path to the config file
pub fn get_config_path() -> Result<PathBuf, AppError> {
    let mut path = dirs::config_dir()
        .ok_or_else(|| AppError::PathError("Could not find config directory".to_string()))?;

    path.push("tierload");
    path.push("config.toml");
    Ok(path)
}

/// Load the config from the given file, falling back to defaults when absent
pub fn load_config_from(path: &Path) -> Result<Config, AppError> {
    if !path.exists() {
        info!(
            "No config file at {}, using defaults",
            path.display()
        );
        return Ok(Config::default());
    }

    let content = fs::read_to_string(path)?;
    Config::from_toml_str(&content).map_err(|e| {
        AppError::ConfigError(format!("Failed to parse {}: {}", path.display(), e))
    })
}

/// Load the user config and apply environment overrides
pub fn load_config() -> Result<Config, AppError> {
    let mut config = load_config_from(&get_config_path()?)?;
    config.apply_overrides(|key| std::env::var(key).ok())?;
    config.validated()
}

/// Render the effective config as TOML
pub fn render_config(config: &Config) -> Result<String, AppError> {
    Ok(toml::to_string_pretty(config)?)
}

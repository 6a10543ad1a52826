//! Main application configuration
//!
//! This module defines the top-level configuration for the rating pipeline,
//! including environment variable loading, TOML files and validation.

use super::rating::RatingConfig;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

/// Main application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub service: ServiceSettings,
    pub rating: RatingConfig,
}

/// Service-level settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Service name for logging and metrics
    pub name: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            name: "wrestling-elo".to_string(),
            log_level: "info".to_string(),
        }
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.parse()
        .map_err(|_| anyhow!("Invalid {} value: {}", key, raw))
}

impl AppConfig {
    /// Load configuration from environment variables with fallback to defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Load configuration from a TOML file, then apply environment overrides
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config: AppConfig = toml::from_str(&raw)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        config.apply_env()?;
        validate_config(&config)?;
        Ok(config)
    }

    fn apply_env(&mut self) -> Result<()> {
        // Service settings
        if let Ok(name) = env::var("SERVICE_NAME") {
            self.service.name = name;
        }
        if let Ok(log_level) = env::var("LOG_LEVEL") {
            self.service.log_level = log_level;
        }

        // Rating settings
        if let Ok(initial) = env::var("RATING_INITIAL") {
            self.rating.initial_rating = parse_env("RATING_INITIAL", &initial)?;
        }
        if let Ok(base_k) = env::var("RATING_BASE_K") {
            self.rating.base_k = parse_env("RATING_BASE_K", &base_k)?;
        }

        // Cooldown settings
        if let Ok(enabled) = env::var("COOLDOWN_ENABLED") {
            self.rating.cooldown.enabled = parse_env("COOLDOWN_ENABLED", &enabled)?;
        }
        if let Ok(days) = env::var("COOLDOWN_THRESHOLD_DAYS") {
            self.rating.cooldown.threshold_days = parse_env("COOLDOWN_THRESHOLD_DAYS", &days)?;
        }
        if let Ok(rate) = env::var("COOLDOWN_RATE_PER_DAY") {
            self.rating.cooldown.rate_per_day = parse_env("COOLDOWN_RATE_PER_DAY", &rate)?;
        }
        if let Ok(floor) = env::var("COOLDOWN_FLOOR") {
            self.rating.cooldown.floor = parse_env("COOLDOWN_FLOOR", &floor)?;
        }
        if let Ok(baseline) = env::var("COOLDOWN_BASELINE") {
            self.rating.cooldown.baseline = parse_env("COOLDOWN_BASELINE", &baseline)?;
        }

        Ok(())
    }
}

/// Validate configuration values
pub fn validate_config(config: &AppConfig) -> Result<()> {
    // Validate log level
    match config.service.log_level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        _ => return Err(anyhow!("Invalid log level: {}", config.service.log_level)),
    }

    if config.service.name.is_empty() {
        return Err(anyhow!("Service name cannot be empty"));
    }

    config.rating.validate()
}

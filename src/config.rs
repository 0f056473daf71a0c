//! Configuration management for Sonic
//!
//! This module handles loading, validation, and management of the application
//! configuration from YAML files with support for environment variable overrides.

use crate::error::{Result, SonicError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

mod defaults;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Remote endpoints and HTTP client settings
    pub api: ApiConfig,

    /// Token lifecycle settings
    pub session: SessionConfig,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// Path of the key/value store holding tokens, vehicle and settings
    pub store_path: String,
}

/// Remote endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the companion auth service (token refresh)
    pub auth_url: String,

    /// Base URL of the vehicle Fleet API
    pub fleet_api_url: String,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// User agent sent with every request
    pub user_agent: String,
}

/// Token lifecycle configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Refresh the access token this many seconds before it expires
    pub refresh_margin_secs: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    pub level: String,

    /// Optional console level override
    pub console_level: Option<String>,

    /// Optional file level override
    pub file_level: Option<String>,

    /// Directory (or file path whose parent is used) for rolling log files
    pub file: String,

    /// Number of rotated files to keep
    pub backup_count: u32,

    /// Whether to log to console
    pub console_output: bool,

    /// Whether to use JSON format
    pub json_format: bool,
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Largest accepted token refresh margin
pub const MAX_REFRESH_MARGIN_SECS: u64 = 24 * 60 * 60;

impl SessionConfig {
    pub fn refresh_margin(&self) -> Result<chrono::Duration> {
        i64::try_from(self.refresh_margin_secs)
            .ok()
            .and_then(chrono::TimeDelta::try_seconds)
            .ok_or_else(|| {
                SonicError::validation("session.refresh_margin_secs", "Margin is out of range")
            })
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from the default locations, then apply env overrides
    pub fn load() -> Result<Self> {
        let default_paths = [
            "sonic_config.yaml",
            "/data/sonic_config.yaml",
            "/etc/sonic/config.yaml",
        ];

        let mut config = default_paths
            .iter()
            .find(|p| Path::new(p).exists())
            .map_or_else(|| Ok(Config::default()), Self::from_file)?;

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a YAML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Override endpoints and the store location from the environment
    pub fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("SONIC_AUTH_URL")
            && !v.trim().is_empty()
        {
            self.api.auth_url = v.trim().to_string();
        }
        if let Ok(v) = std::env::var("SONIC_FLEET_API_URL")
            && !v.trim().is_empty()
        {
            self.api.fleet_api_url = v.trim().to_string();
        }
        if let Ok(v) = std::env::var("SONIC_STORE_PATH")
            && !v.trim().is_empty()
        {
            self.store_path = v.trim().to_string();
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("api.auth_url", &self.api.auth_url),
            ("api.fleet_api_url", &self.api.fleet_api_url),
        ] {
            let parsed = url::Url::parse(value).map_err(|e| {
                SonicError::validation(field.to_string(), format!("invalid URL: {}", e))
            })?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(SonicError::validation(field, "URL must use http or https"));
            }
        }

        if self.api.timeout_secs == 0 {
            return Err(SonicError::validation(
                "api.timeout_secs",
                "Must be greater than 0",
            ));
        }

        if self.session.refresh_margin_secs > MAX_REFRESH_MARGIN_SECS {
            return Err(SonicError::validation(
                "session.refresh_margin_secs".to_string(),
                format!("Must not exceed {} seconds", MAX_REFRESH_MARGIN_SECS),
            ));
        }

        if self.store_path.trim().is_empty() {
            return Err(SonicError::validation(
                "store_path",
                "Store path cannot be empty",
            ));
        }

        crate::logging::parse_log_level(&self.logging.level)
            .map_err(|_| SonicError::validation("logging.level", "Unknown log level"))?;

        Ok(())
    }
}

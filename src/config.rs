//! Configuration loading for regbatch
//!
//! Resolution order: TOML file, then `REGBATCH_*` environment variables.
//! Environment always wins so deployments can override a shared file.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

fn default_database_path() -> PathBuf {
    PathBuf::from("regbatch.db")
}

fn default_session_ttl_minutes() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Runtime configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the SQLite database file
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,

    /// How long cached validation sessions stay reusable
    #[serde(default = "default_session_ttl_minutes")]
    pub session_ttl_minutes: u64,

    /// Tracing filter (e.g. "info", "regbatch=debug")
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            session_ttl_minutes: default_session_ttl_minutes(),
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from an optional TOML file, then apply
    /// environment overrides
    pub fn load(path: Option<&Path>) -> Result<Config> {
        let mut config = match path {
            Some(path) if path.exists() => {
                let content = std::fs::read_to_string(path)
                    .map_err(|e| Error::Config(format!("Read TOML failed: {}", e)))?;
                let config: Config = toml::from_str(&content)
                    .map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))?;
                info!("Configuration loaded from {}", path.display());
                config
            }
            Some(path) => {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            None => Config::default(),
        };

        if let Ok(db_path) = std::env::var("REGBATCH_DATABASE_PATH") {
            config.database_path = PathBuf::from(db_path);
        }
        if let Ok(ttl) = std::env::var("REGBATCH_SESSION_TTL_MINUTES") {
            config.session_ttl_minutes = ttl
                .parse()
                .map_err(|_| Error::Config(format!("Invalid session TTL: {}", ttl)))?;
        }
        if let Ok(level) = std::env::var("REGBATCH_LOG_LEVEL") {
            config.log_level = level;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.session_ttl_minutes, 30);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str("session_ttl_minutes = 5").unwrap();
        assert_eq!(config.session_ttl_minutes, 5);
        assert_eq!(config.database_path, PathBuf::from("regbatch.db"));
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let result = Config::load(Some(Path::new("/nonexistent/regbatch.toml")));
        assert!(matches!(result, Err(Error::Config(_))));
    }
}

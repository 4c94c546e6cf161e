//! RON configuration parsing for the API server

use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use thiserror::Error;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Listen address (e.g., "127.0.0.1:8080")
    #[serde(default = "default_listen")]
    pub listen: String,
    /// Database file; in-memory when absent
    #[serde(default)]
    pub database: Option<String>,
    /// Default tracing filter, overridden by `RUST_LOG`
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Login session lifetime
    #[serde(default = "default_session_ttl")]
    pub session_ttl_hours: u32,
    /// Largest accepted request body in bytes
    #[serde(default = "default_max_body")]
    pub max_body_bytes: usize,
    /// First account, created only while no user exists
    #[serde(default)]
    pub bootstrap_admin: Option<AdminConfig>,
}

/// Bootstrap administrator credentials
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AdminConfig {
    pub username: String,
    pub password: String,
}

fn default_listen() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_session_ttl() -> u32 {
    12
}

fn default_max_body() -> usize {
    64 * 1024
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            database: None,
            log_level: default_log_level(),
            session_ttl_hours: default_session_ttl(),
            max_body_bytes: default_max_body(),
            bootstrap_admin: None,
        }
    }
}

impl Config {
    /// Load configuration from a RON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_ron_str(&content)
    }

    /// Parse and validate configuration text
    pub fn from_ron_str(content: &str) -> Result<Self, ConfigError> {
        let config: Config = ron::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.listen_addr()?;
        if self.session_ttl_hours == 0 {
            return Err(ConfigError::Validation(
                "session_ttl_hours must be positive".to_string(),
            ));
        }
        if self.max_body_bytes == 0 {
            return Err(ConfigError::Validation(
                "max_body_bytes must be positive".to_string(),
            ));
        }
        if let Some(admin) = &self.bootstrap_admin {
            if admin.password.chars().count() < 8 {
                return Err(ConfigError::Validation(
                    "bootstrap_admin password must be at least 8 characters".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Parsed listen address
    pub fn listen_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.listen
            .parse()
            .map_err(|_| ConfigError::Validation(format!("invalid listen address '{}'", self.listen)))
    }

    /// Session lifetime as a duration
    pub fn session_ttl(&self) -> Duration {
        Duration::hours(i64::from(self.session_ttl_hours))
    }
}

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("Validation error: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::from_ron_str("()").unwrap();
        assert_eq!(config.listen, "127.0.0.1:8080");
        assert!(config.database.is_none());
        assert_eq!(config.session_ttl(), Duration::hours(12));
        assert!(config.bootstrap_admin.is_none());
    }

    #[test]
    fn test_full_config() {
        let config = Config::from_ron_str(
            r#"(
                listen: "0.0.0.0:9000",
                database: Some("data/slotqa.db"),
                log_level: "debug",
                session_ttl_hours: 2,
                bootstrap_admin: Some((username: "admin", password: "changeme123")),
            )"#,
        )
        .unwrap();
        assert_eq!(config.listen_addr().unwrap().port(), 9000);
        assert_eq!(config.database.as_deref(), Some("data/slotqa.db"));
        assert_eq!(config.bootstrap_admin.unwrap().username, "admin");
    }

    #[test]
    fn test_invalid_listen() {
        let err = Config::from_ron_str(r#"(listen: "not an address")"#).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_short_admin_password() {
        let err = Config::from_ron_str(
            r#"(bootstrap_admin: Some((username: "admin", password: "short")))"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_parse_error() {
        assert!(matches!(
            Config::from_ron_str("(listen: 42)"),
            Err(ConfigError::Parse(_))
        ));
    }
}

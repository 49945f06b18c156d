//! # Configuration
//!
//! Runtime settings read from environment variables. Every setting has a
//! default except the token signing key, which may only fall back to a
//! development key when `APP_DEBUG` is enabled.

use std::net::SocketAddr;
use std::path::PathBuf;

use chrono::Duration;
use thiserror::Error;
use tracing::warn;

const DEFAULT_DATABASE_URL: &str = "sqlite:growth_tracker.db";
const DEFAULT_MODELS_DIR: &str = "models";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";
const DEV_TOKEN_SECRET: &str = "development-only-signing-key";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required setting {0}")]
    Missing(&'static str),

    #[error("Invalid value '{value}' for {key}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    /// HMAC key for the service's bearer tokens
    pub token_secret: String,
    pub access_token_ttl: Duration,
    pub refresh_token_ttl: Duration,
    pub models_dir: PathBuf,
    pub app_name: String,
    pub app_version: String,
    pub debug: bool,
    pub bind_addr: SocketAddr,
    pub frontend_url: String,
}

impl AppConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let debug = match lookup("APP_DEBUG") {
            Some(value) => parse_bool("APP_DEBUG", &value)?,
            None => false,
        };

        // JWT_SECRET_KEY is the older name for the same key
        let configured = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let token_secret = match configured("TOKEN_SECRET_KEY").or_else(|| configured("JWT_SECRET_KEY")) {
            Some(secret) => secret,
            None if debug => {
                warn!("TOKEN_SECRET_KEY not set, using the development signing key");
                DEV_TOKEN_SECRET.to_string()
            }
            None => return Err(ConfigError::Missing("TOKEN_SECRET_KEY")),
        };

        let access_minutes = parse_positive(&lookup, "ACCESS_TOKEN_EXPIRE_MINUTES", 15)?;
        let refresh_days = parse_positive(&lookup, "REFRESH_TOKEN_EXPIRE_DAYS", 7)?;

        let bind_value = lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_value.parse().map_err(|_| ConfigError::Invalid {
            key: "BIND_ADDR",
            value: bind_value.clone(),
        })?;

        Ok(Self {
            database_url: lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            token_secret,
            access_token_ttl: Duration::minutes(access_minutes),
            refresh_token_ttl: Duration::days(refresh_days),
            models_dir: PathBuf::from(lookup("MODELS_DIR").unwrap_or_else(|| DEFAULT_MODELS_DIR.to_string())),
            app_name: lookup("APP_NAME").unwrap_or_else(|| "Child Growth Tracker".to_string()),
            app_version: lookup("APP_VERSION").unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string()),
            debug,
            bind_addr,
            frontend_url: lookup("FRONTEND_URL").unwrap_or_else(|| "http://localhost:3000".to_string()),
        })
    }
}

fn parse_bool(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::Invalid {
            key,
            value: value.to_string(),
        }),
    }
}

fn parse_positive<F>(lookup: &F, key: &'static str, default: i64) -> Result<i64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(default),
        Some(value) => match value.trim().parse::<i64>() {
            // upper bound keeps chrono's Duration constructors in range
            Ok(n) if n > 0 && n <= 1_000_000 => Ok(n),
            _ => Err(ConfigError::Invalid { key, value }),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[("TOKEN_SECRET_KEY", "secret")]).unwrap();
        assert_eq!(config.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(config.access_token_ttl, Duration::minutes(15));
        assert_eq!(config.refresh_token_ttl, Duration::days(7));
        assert_eq!(config.models_dir, PathBuf::from("models"));
        assert!(!config.debug);
        assert_eq!(config.bind_addr.port(), 8000);
    }

    #[test]
    fn test_secret_required_outside_debug() {
        assert!(matches!(config_from(&[]), Err(ConfigError::Missing("TOKEN_SECRET_KEY"))));

        let config = config_from(&[("APP_DEBUG", "true")]).unwrap();
        assert_eq!(config.token_secret, DEV_TOKEN_SECRET);
    }

    #[test]
    fn test_legacy_secret_name_still_read() {
        let config = config_from(&[("JWT_SECRET_KEY", "legacy")]).unwrap();
        assert_eq!(config.token_secret, "legacy");

        let config = config_from(&[("TOKEN_SECRET_KEY", "current"), ("JWT_SECRET_KEY", "legacy")]).unwrap();
        assert_eq!(config.token_secret, "current");

        let result = config_from(&[("TOKEN_SECRET_KEY", " "), ("JWT_SECRET_KEY", "")]);
        assert!(matches!(result, Err(ConfigError::Missing("TOKEN_SECRET_KEY"))));
    }

    #[test]
    fn test_invalid_numbers_rejected() {
        let result = config_from(&[("TOKEN_SECRET_KEY", "s"), ("ACCESS_TOKEN_EXPIRE_MINUTES", "-5")]);
        assert!(matches!(result, Err(ConfigError::Invalid { key: "ACCESS_TOKEN_EXPIRE_MINUTES", .. })));

        let result = config_from(&[("TOKEN_SECRET_KEY", "s"), ("BIND_ADDR", "not-an-addr")]);
        assert!(matches!(result, Err(ConfigError::Invalid { key: "BIND_ADDR", .. })));
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("TOKEN_SECRET_KEY", "s"),
            ("DATABASE_URL", "sqlite::memory:"),
            ("MODELS_DIR", "/opt/models"),
            ("REFRESH_TOKEN_EXPIRE_DAYS", "30"),
            ("APP_DEBUG", "1"),
        ])
        .unwrap();
        assert_eq!(config.database_url, "sqlite::memory:");
        assert_eq!(config.models_dir, PathBuf::from("/opt/models"));
        assert_eq!(config.refresh_token_ttl, Duration::days(30));
        assert!(config.debug);
    }
}

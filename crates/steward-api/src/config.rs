//! Server configuration from environment variables.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `HOST` | `0.0.0.0` |
//! | `PORT` | `3000` |
//! | `STORAGE_BACKEND` | `postgres` when `DATABASE_URL` is set, else `memory` |
//! | `DATABASE_URL` | unset |
//! | `ALLOWED_ORIGINS` | `http://localhost:3000` |
//! | `RATE_LIMIT_ENABLED` | `true` |
//! | `RATE_LIMIT_REQUESTS` | `100` |
//! | `RATE_LIMIT_PERIOD_SECS` | `60` |
//! | `SESSION_CAPACITY` | `1024` |

use axum::http::HeaderValue;

use steward_core::defaults::{
    RATE_LIMIT_PERIOD_SECS, RATE_LIMIT_REQUESTS, SERVER_PORT, SESSION_CAPACITY,
};
use steward_core::{Error, Result};

const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:3000";

/// Where records are kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageConfig {
    Memory,
    Postgres { url: String },
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub storage: StorageConfig,
    pub allowed_origins: Vec<HeaderValue>,
    pub rate_limit_enabled: bool,
    pub rate_limit_requests: u32,
    pub rate_limit_period_secs: u64,
    pub session_capacity: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: SERVER_PORT,
            storage: StorageConfig::Memory,
            allowed_origins: parse_allowed_origins(DEFAULT_ALLOWED_ORIGINS),
            rate_limit_enabled: true,
            rate_limit_requests: RATE_LIMIT_REQUESTS,
            rate_limit_period_secs: RATE_LIMIT_PERIOD_SECS,
            session_capacity: SESSION_CAPACITY,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let storage = match (get("STORAGE_BACKEND").as_deref(), get("DATABASE_URL")) {
            (Some("memory"), _) | (None, None) => StorageConfig::Memory,
            (Some("postgres") | None, Some(url)) => StorageConfig::Postgres { url },
            (Some("postgres"), None) => {
                return Err(Error::Config(
                    "STORAGE_BACKEND=postgres requires DATABASE_URL".to_string(),
                ))
            }
            (Some(other), _) => {
                return Err(Error::Config(format!("Unknown STORAGE_BACKEND: {}", other)))
            }
        };

        let config = Self {
            host: get("HOST").unwrap_or(defaults.host),
            port: parse(get("PORT"), "PORT")?.unwrap_or(defaults.port),
            storage,
            allowed_origins: get("ALLOWED_ORIGINS")
                .map(|v| parse_allowed_origins(&v))
                .unwrap_or(defaults.allowed_origins),
            rate_limit_enabled: get("RATE_LIMIT_ENABLED")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(defaults.rate_limit_enabled),
            rate_limit_requests: parse(get("RATE_LIMIT_REQUESTS"), "RATE_LIMIT_REQUESTS")?
                .unwrap_or(defaults.rate_limit_requests),
            rate_limit_period_secs: parse(get("RATE_LIMIT_PERIOD_SECS"), "RATE_LIMIT_PERIOD_SECS")?
                .unwrap_or(defaults.rate_limit_period_secs),
            session_capacity: parse(get("SESSION_CAPACITY"), "SESSION_CAPACITY")?
                .unwrap_or(defaults.session_capacity),
        };

        if config.rate_limit_enabled
            && (config.rate_limit_requests == 0 || config.rate_limit_period_secs == 0)
        {
            return Err(Error::Config(
                "RATE_LIMIT_REQUESTS and RATE_LIMIT_PERIOD_SECS must be positive".to_string(),
            ));
        }
        if config.session_capacity == 0 {
            return Err(Error::Config("SESSION_CAPACITY must be positive".to_string()));
        }
        Ok(config)
    }
}

fn parse<T: std::str::FromStr>(value: Option<String>, key: &str) -> Result<Option<T>> {
    value
        .map(|v| {
            v.trim()
                .parse::<T>()
                .map_err(|_| Error::Config(format!("{} is not valid: {}", key, v)))
        })
        .transpose()
}

/// Parse a comma-separated origin list. Invalid entries are skipped with a
/// warning; an empty list falls back to the default origin.
pub fn parse_allowed_origins(origins: &str) -> Vec<HeaderValue> {
    let parsed: Vec<HeaderValue> = origins
        .split(',')
        .filter_map(|s| {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            if trimmed == "*" {
                tracing::warn!("Wildcard CORS origin ignored");
                return None;
            }
            match trimmed.parse::<HeaderValue>() {
                Ok(v) => Some(v),
                Err(e) => {
                    tracing::warn!("Invalid CORS origin '{}': {}", trimmed, e);
                    None
                }
            }
        })
        .collect();

    if parsed.is_empty() {
        vec![HeaderValue::from_static(DEFAULT_ALLOWED_ORIGINS)]
    } else {
        parsed
    }
}

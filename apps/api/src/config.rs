use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{FixedOffset, Offset, Utc};

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub auth_service_url: String,
    pub port: u16,
    pub rust_log: String,
    pub session_timeout: Duration,
    pub http_client_timeout: Duration,
    /// Minutes east of UTC used as "local time" for date filters.
    pub utc_offset_minutes: i32,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let utc_offset_minutes = optional_env("DASHBOARD_UTC_OFFSET_MINUTES", 0_i32)?;
        offset_from_minutes(utc_offset_minutes)
            .context("DASHBOARD_UTC_OFFSET_MINUTES must be within +/- 24h")?;
        let session_timeout_ms = optional_env("SESSION_TIMEOUT_MS", 8000_u64)?;
        let client_timeout_secs = optional_env("HTTP_CLIENT_TIMEOUT_SECS", 30_u64)?;

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            database_max_connections: optional_env("DATABASE_MAX_CONNECTIONS", 10_u32)?,
            auth_service_url: require_env("AUTH_SERVICE_URL")?,
            port: optional_env("PORT", 8080_u16)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            session_timeout: Duration::from_millis(session_timeout_ms),
            http_client_timeout: Duration::from_secs(client_timeout_secs),
            utc_offset_minutes,
        })
    }

    pub fn local_offset(&self) -> FixedOffset {
        offset_from_minutes(self.utc_offset_minutes).unwrap_or_else(|| Utc.fix())
    }
}

fn offset_from_minutes(minutes: i32) -> Option<FixedOffset> {
    minutes.checked_mul(60).and_then(FixedOffset::east_opt)
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value: '{raw}'")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
impl Config {
    pub fn for_tests() -> Self {
        Config {
            database_url: "postgres://localhost/valuations_test".to_string(),
            database_max_connections: 1,
            auth_service_url: "http://auth.invalid".to_string(),
            port: 0,
            rust_log: "debug".to_string(),
            session_timeout: Duration::from_millis(8000),
            http_client_timeout: Duration::from_secs(5),
            utc_offset_minutes: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_bounds() {
        assert_eq!(
            offset_from_minutes(330).map(|o| o.local_minus_utc()),
            Some(330 * 60)
        );
        assert!(offset_from_minutes(-24 * 60).is_none());
        assert!(offset_from_minutes(i32::MAX).is_none());
    }

    #[test]
    fn test_local_offset_falls_back_to_utc() {
        let mut config = Config::for_tests();
        config.utc_offset_minutes = 10_000;
        assert_eq!(config.local_offset(), Utc.fix());
    }
}

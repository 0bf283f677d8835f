//! Store configuration, sourced from the environment.

use std::time::Duration;

use thiserror::Error;

const DEFAULT_LOCK_TIMEOUT_MS: u64 = 5_000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Connection and locking settings for the Postgres store.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub database_url: String,
    pub lock_timeout: Duration,
}

impl StoreConfig {
    /// Read `DATABASE_URL` (required) and `LOCK_TIMEOUT_MS` (optional,
    /// default 5000).
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url =
            std::env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))?;

        let lock_timeout_ms = match std::env::var("LOCK_TIMEOUT_MS") {
            Ok(raw) => raw.parse::<u64>().map_err(|_| ConfigError::Invalid {
                name: "LOCK_TIMEOUT_MS",
                value: raw,
            })?,
            Err(_) => DEFAULT_LOCK_TIMEOUT_MS,
        };

        Ok(Self {
            database_url,
            lock_timeout: Duration::from_millis(lock_timeout_ms),
        })
    }
}

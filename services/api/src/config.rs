//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Which store backs the service.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "memory" => Ok(Self::Memory),
            other => Err(format!("'{}' is not a known store backend", other)),
        }
    }
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub store_backend: StoreBackend,
    /// Required when `store_backend` is `Postgres`.
    pub database_url: Option<String>,
    pub log_level: Level,
    /// Bookings raise a notification only when this is set.
    pub admin_email: Option<String>,
    pub cors_origin: String,
    /// `None` disables the background expiry sweep.
    pub expiry_sweep_interval: Option<Duration>,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key/value source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // --- Server ---
        let bind_address_str = lookup("BIND_ADDRESS").unwrap_or_else(|| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        // --- Store ---
        let store_backend = lookup("STORE_BACKEND")
            .unwrap_or_else(|| "postgres".to_string())
            .parse::<StoreBackend>()
            .map_err(|e| ConfigError::InvalidValue("STORE_BACKEND".to_string(), e))?;

        let database_url = lookup("DATABASE_URL").filter(|v| !v.trim().is_empty());
        if store_backend == StoreBackend::Postgres && database_url.is_none() {
            return Err(ConfigError::MissingVar("DATABASE_URL".to_string()));
        }

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Shop ---
        let admin_email = lookup("ADMIN_EMAIL").filter(|v| !v.trim().is_empty());
        let cors_origin =
            lookup("CORS_ORIGIN").unwrap_or_else(|| "http://localhost:3000".to_string());

        let sweep_secs = match lookup("EXPIRY_SWEEP_SECS") {
            Some(raw) => raw.trim().parse::<u64>().map_err(|_| {
                ConfigError::InvalidValue(
                    "EXPIRY_SWEEP_SECS".to_string(),
                    format!("'{}' is not a number of seconds", raw),
                )
            })?,
            None => 300,
        };
        let expiry_sweep_interval = (sweep_secs > 0).then(|| Duration::from_secs(sweep_secs));

        Ok(Self {
            bind_address,
            store_backend,
            database_url,
            log_level,
            admin_email,
            cors_origin,
            expiry_sweep_interval,
        })
    }

    /// An in-memory configuration for tests and local demos.
    pub fn in_memory() -> Self {
        Self {
            bind_address: SocketAddr::from(([127, 0, 0, 1], 3000)),
            store_backend: StoreBackend::Memory,
            database_url: None,
            log_level: Level::INFO,
            admin_email: None,
            cors_origin: "http://localhost:3000".to_string(),
            expiry_sweep_interval: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn postgres_backend_requires_database_url() {
        assert!(matches!(load(&[]), Err(ConfigError::MissingVar(v)) if v == "DATABASE_URL"));
    }

    #[test]
    fn memory_backend_uses_defaults() {
        let config = load(&[("STORE_BACKEND", "memory")]).unwrap();
        assert_eq!(config.store_backend, StoreBackend::Memory);
        assert_eq!(config.bind_address.port(), 3000);
        assert_eq!(config.expiry_sweep_interval, Some(Duration::from_secs(300)));
        assert!(config.admin_email.is_none());
    }

    #[test]
    fn zero_sweep_interval_disables_the_sweeper() {
        let config = load(&[
            ("DATABASE_URL", "postgres://localhost/barbershop"),
            ("EXPIRY_SWEEP_SECS", "0"),
            ("ADMIN_EMAIL", "owner@example.com"),
        ])
        .unwrap();
        assert_eq!(config.expiry_sweep_interval, None);
        assert_eq!(config.admin_email.as_deref(), Some("owner@example.com"));
    }

    #[test]
    fn invalid_values_are_reported() {
        assert!(matches!(
            load(&[("STORE_BACKEND", "sqlite")]),
            Err(ConfigError::InvalidValue(v, _)) if v == "STORE_BACKEND"
        ));
        assert!(matches!(
            load(&[("STORE_BACKEND", "memory"), ("RUST_LOG", "loud")]),
            Err(ConfigError::InvalidValue(v, _)) if v == "RUST_LOG"
        ));
    }
}

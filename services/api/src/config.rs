//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Which backing store the service runs against.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres { database_url: String, max_connections: u32 },
    Memory,
}

/// Settings for issuing and validating bearer tokens.
#[derive(Clone, Debug)]
pub struct JwtConfig {
    pub secret: SecretString,
    pub issuer: String,
    pub ttl: Duration,
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub store: StoreBackend,
    pub store_timeout: Duration,
    pub log_level: Level,
    pub jwt: JwtConfig,
    pub covers_dir: PathBuf,
    pub max_cover_bytes: usize,
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

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // --- Load Server Settings ---
        let bind_address = parsed(&lookup, "BIND_ADDRESS", "0.0.0.0:3000")?;

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Load Store Settings ---
        let backend = lookup("STORE_BACKEND").unwrap_or_else(|| "postgres".to_string());
        let store = match backend.trim().to_lowercase().as_str() {
            "postgres" => StoreBackend::Postgres {
                database_url: lookup("DATABASE_URL")
                    .ok_or_else(|| ConfigError::MissingVar("DATABASE_URL".to_string()))?,
                max_connections: parsed(&lookup, "DATABASE_MAX_CONNECTIONS", "5")?,
            },
            "memory" => StoreBackend::Memory,
            other => {
                return Err(ConfigError::InvalidValue(
                    "STORE_BACKEND".to_string(),
                    format!("'{}' is not one of postgres, memory", other),
                ))
            }
        };
        let store_timeout = Duration::from_secs(parsed(&lookup, "STORE_TIMEOUT_SECS", "30")?);

        // --- Load Token Settings ---
        let secret = lookup("JWT_SECRET")
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ConfigError::MissingVar("JWT_SECRET".to_string()))?;
        let issuer = lookup("JWT_ISSUER").unwrap_or_else(|| "streaming-catalog".to_string());
        let ttl_hours: u64 = parsed(&lookup, "JWT_TTL_HOURS", "24")?;
        let ttl_secs = ttl_hours
            .checked_mul(3600)
            .filter(|secs| i64::try_from(*secs).is_ok())
            .ok_or_else(|| {
                ConfigError::InvalidValue("JWT_TTL_HOURS".to_string(), format!("{ttl_hours} hours is too long"))
            })?;

        // --- Load Cover Storage Settings ---
        let covers_dir = lookup("COVERS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./covers"));
        let max_cover_bytes = parsed(&lookup, "MAX_COVER_BYTES", "8388608")?;

        Ok(Self {
            bind_address,
            store,
            store_timeout,
            log_level,
            jwt: JwtConfig {
                secret: SecretString::from(secret),
                issuer,
                ttl: Duration::from_secs(ttl_secs),
            },
            covers_dir,
            max_cover_bytes,
        })
    }
}

fn parsed<T, F>(lookup: &F, key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key).unwrap_or_else(|| default.to_string());
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidValue(key.to_string(), e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply() {
        let config = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/catalog"),
            ("JWT_SECRET", "dev-secret"),
        ]))
        .unwrap();

        assert_eq!(config.bind_address.to_string(), "0.0.0.0:3000");
        assert_eq!(
            config.store,
            StoreBackend::Postgres {
                database_url: "postgres://localhost/catalog".into(),
                max_connections: 5
            }
        );
        assert_eq!(config.store_timeout, Duration::from_secs(30));
        assert_eq!(config.log_level, Level::INFO);
        assert_eq!(config.jwt.issuer, "streaming-catalog");
        assert_eq!(config.jwt.ttl, Duration::from_secs(24 * 3600));
        assert_eq!(config.jwt.secret.expose_secret(), "dev-secret");
        assert_eq!(config.covers_dir, PathBuf::from("./covers"));
        assert_eq!(config.max_cover_bytes, 8 * 1024 * 1024);
    }

    #[test]
    fn memory_backend_needs_no_database() {
        let config = Config::from_lookup(lookup_from(&[
            ("STORE_BACKEND", "Memory"),
            ("JWT_SECRET", "dev-secret"),
        ]))
        .unwrap();
        assert_eq!(config.store, StoreBackend::Memory);
    }

    #[test]
    fn jwt_secret_is_required() {
        let err = Config::from_lookup(lookup_from(&[("STORE_BACKEND", "memory")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar(var) if var == "JWT_SECRET"));
    }

    #[test]
    fn bad_values_name_the_variable() {
        let err = Config::from_lookup(lookup_from(&[
            ("STORE_BACKEND", "memory"),
            ("JWT_SECRET", "s"),
            ("STORE_TIMEOUT_SECS", "soon"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(var, _) if var == "STORE_TIMEOUT_SECS"));

        let err = Config::from_lookup(lookup_from(&[("STORE_BACKEND", "mongo"), ("JWT_SECRET", "s")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(var, _) if var == "STORE_BACKEND"));
    }

    #[test]
    fn oversized_token_lifetime_is_rejected() {
        let err = Config::from_lookup(lookup_from(&[
            ("STORE_BACKEND", "memory"),
            ("JWT_SECRET", "s"),
            ("JWT_TTL_HOURS", u64::MAX.to_string().as_str()),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(var, _) if var == "JWT_TTL_HOURS"));

        let config = Config::from_lookup(lookup_from(&[
            ("STORE_BACKEND", "memory"),
            ("JWT_SECRET", "s"),
            ("JWT_TTL_HOURS", "2"),
        ]))
        .unwrap();
        assert_eq!(config.jwt.ttl, Duration::from_secs(7200));
    }
}

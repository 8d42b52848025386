//! Checkout engine configuration.
//!
//! Configuration is loaded from environment variables with fallback to defaults.
//!
//! | Variable                           | Default         |
//! |------------------------------------|-----------------|
//! | `EMPORIUM_DATABASE_PATH`           | `./emporium.db` |
//! | `EMPORIUM_DB_MAX_CONNECTIONS`      | `5`             |
//! | `EMPORIUM_DB_MIN_CONNECTIONS`      | `1`             |
//! | `EMPORIUM_DB_ACQUIRE_TIMEOUT_SECS` | `30`            |
//! | `EMPORIUM_DB_BUSY_TIMEOUT_MS`      | `5000`          |
//! | `EMPORIUM_RUN_MIGRATIONS`          | `true`          |
//! | `EMPORIUM_ORDER_LIST_LIMIT`        | `50`            |

use std::env;
use std::str::FromStr;
use std::time::Duration;

use emporium_db::DbConfig;
use serde::{Deserialize, Serialize};

/// Checkout engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutConfig {
    /// SQLite database file
    pub database_path: String,

    /// Pool upper bound
    pub db_max_connections: u32,

    /// Connections kept open while idle
    pub db_min_connections: u32,

    /// Longest wait for a pooled connection
    pub db_acquire_timeout_secs: u64,

    /// Longest wait on the SQLite write lock
    pub db_busy_timeout_ms: u64,

    /// Apply embedded migrations on startup
    pub run_migrations: bool,

    /// Largest page returned by the order listings
    pub order_list_limit: u32,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        CheckoutConfig {
            database_path: "./emporium.db".to_string(),
            db_max_connections: 5,
            db_min_connections: 1,
            db_acquire_timeout_secs: 30,
            db_busy_timeout_ms: 5000,
            run_migrations: true,
            order_list_limit: 50,
        }
    }
}

impl CheckoutConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from any key/value source.
    ///
    /// `load()` passes the process environment; tests pass a map.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = CheckoutConfig::default();

        let config = CheckoutConfig {
            database_path: lookup("EMPORIUM_DATABASE_PATH")
                .filter(|p| !p.trim().is_empty())
                .unwrap_or(defaults.database_path),

            db_max_connections: parse_or(
                &lookup,
                "EMPORIUM_DB_MAX_CONNECTIONS",
                defaults.db_max_connections,
            )?,

            db_min_connections: parse_or(
                &lookup,
                "EMPORIUM_DB_MIN_CONNECTIONS",
                defaults.db_min_connections,
            )?,

            db_acquire_timeout_secs: parse_or(
                &lookup,
                "EMPORIUM_DB_ACQUIRE_TIMEOUT_SECS",
                defaults.db_acquire_timeout_secs,
            )?,

            db_busy_timeout_ms: parse_or(
                &lookup,
                "EMPORIUM_DB_BUSY_TIMEOUT_MS",
                defaults.db_busy_timeout_ms,
            )?,

            run_migrations: parse_or(&lookup, "EMPORIUM_RUN_MIGRATIONS", defaults.run_migrations)?,

            order_list_limit: parse_or(
                &lookup,
                "EMPORIUM_ORDER_LIST_LIMIT",
                defaults.order_list_limit,
            )?,
        };

        if config.db_max_connections == 0 {
            return Err(ConfigError::InvalidValue(
                "EMPORIUM_DB_MAX_CONNECTIONS".to_string(),
            ));
        }

        if config.db_min_connections > config.db_max_connections {
            return Err(ConfigError::InvalidPoolSize {
                min: config.db_min_connections,
                max: config.db_max_connections,
            });
        }

        if config.order_list_limit == 0 {
            return Err(ConfigError::InvalidValue(
                "EMPORIUM_ORDER_LIST_LIMIT".to_string(),
            ));
        }

        Ok(config)
    }

    /// Database settings for `emporium_db::Database::new`.
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.database_path)
            .max_connections(self.db_max_connections)
            .min_connections(self.db_min_connections)
            .acquire_timeout(Duration::from_secs(self.db_acquire_timeout_secs))
            .busy_timeout(Duration::from_millis(self.db_busy_timeout_ms))
            .run_migrations(self.run_migrations)
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key.to_string())),
        None => Ok(default),
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Pool minimum ({min}) exceeds maximum ({max})")]
    InvalidPoolSize { min: u32, max: u32 },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_pairs(pairs: &[(&str, &str)]) -> Result<CheckoutConfig, ConfigError> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        CheckoutConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = from_pairs(&[]).unwrap();
        assert_eq!(config, CheckoutConfig::default());
        assert_eq!(config.database_path, "./emporium.db");
        assert_eq!(config.order_list_limit, 50);
    }

    #[test]
    fn test_overrides() {
        let config = from_pairs(&[
            ("EMPORIUM_DATABASE_PATH", "/tmp/shop.db"),
            ("EMPORIUM_DB_MAX_CONNECTIONS", "8"),
            ("EMPORIUM_DB_BUSY_TIMEOUT_MS", " 250 "),
            ("EMPORIUM_RUN_MIGRATIONS", "false"),
        ])
        .unwrap();

        assert_eq!(config.database_path, "/tmp/shop.db");
        assert_eq!(config.db_max_connections, 8);
        assert_eq!(config.db_busy_timeout_ms, 250);
        assert!(!config.run_migrations);

        let db = config.db_config();
        assert_eq!(db.max_connections, 8);
        assert_eq!(db.busy_timeout, Duration::from_millis(250));
        assert!(!db.run_migrations);
    }

    #[test]
    fn test_invalid_number() {
        let err = from_pairs(&[("EMPORIUM_DB_MAX_CONNECTIONS", "lots")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(ref v) if v == "EMPORIUM_DB_MAX_CONNECTIONS"));
    }

    #[test]
    fn test_pool_bounds() {
        let err = from_pairs(&[
            ("EMPORIUM_DB_MIN_CONNECTIONS", "4"),
            ("EMPORIUM_DB_MAX_CONNECTIONS", "2"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPoolSize { min: 4, max: 2 }));

        assert!(from_pairs(&[("EMPORIUM_DB_MAX_CONNECTIONS", "0")]).is_err());
        assert!(from_pairs(&[("EMPORIUM_ORDER_LIST_LIMIT", "0")]).is_err());
    }
}

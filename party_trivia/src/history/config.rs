//! History store configuration.

use log::warn;
use std::{env, str::FromStr};

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub database_url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,

    /// Connection timeout in seconds
    pub connection_timeout_secs: u64,

    /// Idle connection timeout in seconds
    pub idle_timeout_secs: u64,

    /// Maximum connection lifetime in seconds
    pub max_lifetime_secs: u64,
}

impl DatabaseConfig {
    /// Create configuration from environment variables
    ///
    /// Expected environment variables:
    /// - `HISTORY_DATABASE_URL`: PostgreSQL connection string; history is
    ///   disabled when unset
    /// - `HISTORY_DB_MAX_CONNECTIONS`: Maximum pool size (default: 5)
    /// - `HISTORY_DB_MIN_CONNECTIONS`: Minimum pool size (default: 1)
    /// - `HISTORY_DB_CONNECTION_TIMEOUT`: Connection timeout in seconds (default: 10)
    /// - `HISTORY_DB_IDLE_TIMEOUT`: Idle timeout in seconds (default: 600)
    /// - `HISTORY_DB_MAX_LIFETIME`: Max lifetime in seconds (default: 1800)
    ///
    /// Malformed numbers fall back to their defaults with a warning.
    pub fn from_env() -> Option<Self> {
        let database_url = env::var("HISTORY_DATABASE_URL").ok()?;
        let defaults = Self::with_url(database_url);
        Some(Self {
            max_connections: env_or("HISTORY_DB_MAX_CONNECTIONS", defaults.max_connections),
            min_connections: env_or("HISTORY_DB_MIN_CONNECTIONS", defaults.min_connections),
            connection_timeout_secs: env_or(
                "HISTORY_DB_CONNECTION_TIMEOUT",
                defaults.connection_timeout_secs,
            ),
            idle_timeout_secs: env_or("HISTORY_DB_IDLE_TIMEOUT", defaults.idle_timeout_secs),
            max_lifetime_secs: env_or("HISTORY_DB_MAX_LIFETIME", defaults.max_lifetime_secs),
            ..defaults
        })
    }

    /// Default pool settings for the given URL
    pub fn with_url(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_connections: 5,
            min_connections: 1,
            connection_timeout_secs: 10,
            idle_timeout_secs: 600,
            max_lifetime_secs: 1800,
        }
    }
}

fn env_or<T: FromStr + Copy>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("{key}={raw} is not valid, using the default");
            default
        }),
        Err(_) => default,
    }
}

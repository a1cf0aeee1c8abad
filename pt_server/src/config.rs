//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use party_trivia::{GameSettings, history::DatabaseConfig};
use std::{
    net::{Ipv4Addr, SocketAddr},
    path::PathBuf,
};

/// Default bind address when neither `--bind` nor `SERVER_BIND` is given
pub const DEFAULT_BIND: SocketAddr = SocketAddr::new(
    std::net::IpAddr::V4(Ipv4Addr::LOCALHOST),
    7878,
);

/// Complete server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server bind address
    pub bind: SocketAddr,
    /// JSON question catalog; the built-in sample is used when unset
    pub catalog_path: Option<PathBuf>,
    /// Standings history database; history stays in memory when unset
    pub history: Option<DatabaseConfig>,
    /// Whether `/metrics` serves Prometheus text
    pub metrics_enabled: bool,
    /// Limits and defaults for sessions created over the API
    pub sessions: SessionDefaults,
}

/// Defaults applied to sessions created over the API
#[derive(Debug, Clone)]
pub struct SessionDefaults {
    /// Settings used when a create request omits them
    pub settings: GameSettings,
    /// Maximum number of concurrently open sessions
    pub max_sessions: usize,
    /// Per-connection buffer of pending snapshot pushes
    pub subscriber_buffer: usize,
}

impl Default for SessionDefaults {
    fn default() -> Self {
        Self {
            settings: GameSettings::default(),
            max_sessions: 32,
            subscriber_buffer: 64,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Arguments
    ///
    /// * `bind_override` - Optional bind address override (from CLI args)
    /// * `database_url_override` - Optional history database URL (from CLI args)
    /// * `catalog_override` - Optional catalog file (from CLI args)
    ///
    /// # Errors
    ///
    /// Returns error if a variable is present but malformed
    pub fn from_env(
        bind_override: Option<SocketAddr>,
        database_url_override: Option<String>,
        catalog_override: Option<PathBuf>,
    ) -> Result<Self, ConfigError> {
        let bind = match bind_override {
            Some(bind) => bind,
            None => match std::env::var("SERVER_BIND") {
                Ok(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                    var: "SERVER_BIND".to_string(),
                    reason: format!("'{raw}' is not an IP:PORT address"),
                })?,
                Err(_) => DEFAULT_BIND,
            },
        };

        let catalog_path =
            catalog_override.or_else(|| std::env::var("TRIVIA_CATALOG").ok().map(PathBuf::from));

        let history = match database_url_override {
            Some(url) => Some(DatabaseConfig {
                database_url: url,
                ..DatabaseConfig::from_env()
                    .unwrap_or_else(|| DatabaseConfig::with_url(String::new()))
            }),
            None => DatabaseConfig::from_env(),
        };

        let base = GameSettings::default();
        let settings = GameSettings {
            max_players: parse_env_or("SESSION_MAX_PLAYERS", base.max_players),
            target_score: parse_env_or("SESSION_TARGET_SCORE", base.target_score),
            game_clock_secs: parse_env_or("SESSION_GAME_CLOCK_SECS", base.game_clock_secs),
            betting_secs: parse_env_or("SESSION_BETTING_SECS", base.betting_secs),
            precision_secs: parse_env_or("SESSION_PRECISION_SECS", base.precision_secs),
            ..base
        };

        let sessions = SessionDefaults {
            settings,
            max_sessions: parse_env_or("MAX_SESSIONS", 32),
            subscriber_buffer: parse_env_or("WS_SUBSCRIBER_BUFFER", 64),
        };

        Ok(ServerConfig {
            bind,
            catalog_path,
            history,
            metrics_enabled: parse_env_or("METRICS_ENABLED", true),
            sessions,
        })
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sessions.max_sessions == 0 {
            return Err(ConfigError::Invalid {
                var: "MAX_SESSIONS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.sessions.subscriber_buffer == 0 {
            return Err(ConfigError::Invalid {
                var: "WS_SUBSCRIBER_BUFFER".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if let Some(history) = &self.history {
            if history.database_url.is_empty() {
                return Err(ConfigError::Invalid {
                    var: "HISTORY_DATABASE_URL".to_string(),
                    reason: "Must not be empty".to_string(),
                });
            }
            if history.min_connections > history.max_connections {
                return Err(ConfigError::Invalid {
                    var: "HISTORY_DB_MIN_CONNECTIONS".to_string(),
                    reason: format!(
                        "Cannot exceed max connections ({})",
                        history.max_connections
                    ),
                });
            }
        }

        self.sessions
            .settings
            .validate()
            .map_err(|e| ConfigError::Invalid {
                var: "SESSION_*".to_string(),
                reason: e.to_string(),
            })
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

/// Helper to parse environment variable with default fallback
fn parse_env_or<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

//! Persistence collaborator for finished games.
//!
//! The session engine never depends on this for correctness: recording
//! failures are logged by the actor and otherwise ignored.

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::{
    sync::{Mutex, PoisonError},
    time::Duration,
};
use thiserror::Error;

use crate::game::FinalStandings;

pub mod config;
pub mod postgres;

pub use config::DatabaseConfig;
pub use postgres::PgStandingsRecorder;

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

pub type HistoryResult<T> = Result<T, HistoryError>;

#[async_trait]
pub trait StandingsRecorder: Send + Sync {
    /// Durably store a finished game's standings
    async fn record(&self, standings: &FinalStandings) -> HistoryResult<()>;

    /// Most recently finished games, newest first
    async fn recent(&self, limit: usize) -> HistoryResult<Vec<FinalStandings>>;
}

/// Keeps standings in memory. Used when no database is configured.
#[derive(Debug, Default)]
pub struct MemoryStandingsRecorder {
    records: Mutex<Vec<FinalStandings>>,
}

impl MemoryStandingsRecorder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl StandingsRecorder for MemoryStandingsRecorder {
    async fn record(&self, standings: &FinalStandings) -> HistoryResult<()> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(standings.clone());
        Ok(())
    }

    async fn recent(&self, limit: usize) -> HistoryResult<Vec<FinalStandings>> {
        let records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(records.iter().rev().take(limit).cloned().collect())
    }
}

/// Database connection pool wrapper
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool
    pub async fn new(config: &DatabaseConfig) -> HistoryResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout_secs))
            .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
            .max_lifetime(Duration::from_secs(config.max_lifetime_secs))
            .connect(&config.database_url)
            .await?;

        Ok(Self { pool })
    }

    /// Apply the bundled schema migrations
    pub async fn migrate(&self) -> HistoryResult<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Check if the database connection is healthy
    pub async fn health_check(&self) -> HistoryResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Close the database connection pool
    pub async fn close(self) {
        self.pool.close().await;
    }
}

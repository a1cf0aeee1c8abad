//! PostgreSQL-backed standings history.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use super::{HistoryResult, StandingsRecorder};
use crate::game::{FinalStandings, StandingEntry};

pub struct PgStandingsRecorder {
    pool: PgPool,
}

impl PgStandingsRecorder {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StandingsRecorder for PgStandingsRecorder {
    async fn record(&self, standings: &FinalStandings) -> HistoryResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO finished_sessions (session_id, session_name, rounds_played, winner_player_id, finished_at)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (session_id) DO NOTHING",
        )
        .bind(standings.session_id)
        .bind(&standings.session_name)
        .bind(i64::from(standings.rounds_played))
        .bind(standings.winner.map(i64::from))
        .bind(standings.finished_at)
        .execute(&mut *tx)
        .await?;

        for entry in &standings.entries {
            sqlx::query(
                "INSERT INTO session_standings (session_id, player_id, player_name, rank, score)
                 VALUES ($1, $2, $3, $4, $5)
                 ON CONFLICT (session_id, player_id) DO NOTHING",
            )
            .bind(standings.session_id)
            .bind(i64::from(entry.player_id))
            .bind(&entry.name)
            .bind(i64::from(entry.rank))
            .bind(i64::from(entry.score))
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn recent(&self, limit: usize) -> HistoryResult<Vec<FinalStandings>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = sqlx::query(
            "SELECT session_id, session_name, rounds_played, winner_player_id, finished_at
             FROM finished_sessions
             ORDER BY finished_at DESC
             LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        let mut results = Vec::with_capacity(rows.len());
        for row in rows {
            let session_id: Uuid = row.get("session_id");
            let entries = sqlx::query(
                "SELECT player_id, player_name, rank, score
                 FROM session_standings
                 WHERE session_id = $1
                 ORDER BY rank, player_id",
            )
            .bind(session_id)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(|r| StandingEntry {
                rank: to_u32(r.get("rank")),
                player_id: to_u32(r.get("player_id")),
                name: r.get("player_name"),
                score: to_u32(r.get("score")),
            })
            .collect();

            let winner: Option<i64> = row.get("winner_player_id");
            let finished_at: DateTime<Utc> = row.get("finished_at");
            results.push(FinalStandings {
                session_id,
                session_name: row.get("session_name"),
                rounds_played: to_u32(row.get("rounds_played")),
                winner: winner.map(to_u32),
                finished_at,
                entries,
            });
        }
        Ok(results)
    }
}

fn to_u32(value: i64) -> u32 {
    u32::try_from(value).unwrap_or_default()
}

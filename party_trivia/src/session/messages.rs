//! Session actor message types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

use crate::catalog::{CatalogEntry, CatalogResult};
use crate::game::{
    CommandOutcome, FinalStandings, GameEvent, SessionCommand, SessionId, SessionResult,
    SessionSnapshot, SessionStatus, TimerKind,
};

/// Messages that can be sent to a SessionActor
#[derive(Debug)]
pub enum SessionMessage {
    /// Apply one command from the moderator device
    Command {
        command: SessionCommand,
        response: oneshot::Sender<SessionResult<CommandOutcome>>,
    },

    /// Read-only view of the whole session
    GetSnapshot {
        response: oneshot::Sender<SessionSnapshot>,
    },

    /// Registry listing data
    GetMetadata {
        response: oneshot::Sender<SessionMetadata>,
    },

    /// Standings as they would be recorded if the game ended now
    GetStandings {
        response: oneshot::Sender<FinalStandings>,
    },

    /// Start receiving an update after every mutation. The current snapshot
    /// comes back immediately.
    Subscribe {
        subscriber_id: Uuid,
        sender: mpsc::Sender<SessionUpdate>,
        response: oneshot::Sender<SessionSnapshot>,
    },

    /// Stop receiving updates
    Unsubscribe { subscriber_id: Uuid },

    /// Stop the actor
    Close { response: oneshot::Sender<()> },

    /// The catalog answered a fetch (internal)
    RoundFetched {
        generation: u64,
        result: CatalogResult<CatalogEntry>,
    },

    /// The audio collaborator reported the end of playback (internal)
    PlaybackFinished { generation: u64 },

    /// A countdown ran out (internal)
    TimerFired { timer: TimerKind, generation: u64 },
}

/// Pushed to subscribers after every mutation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionUpdate {
    pub snapshot: SessionSnapshot,
    pub events: Vec<GameEvent>,
}

/// Session metadata for discovery
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionMetadata {
    pub id: SessionId,
    pub name: String,
    pub status: SessionStatus,
    pub player_count: usize,
    pub max_players: usize,
    pub round_counter: u32,
    pub clock_remaining_secs: u64,
    pub created_at: DateTime<Utc>,
}

impl SessionMetadata {
    #[must_use]
    pub fn clock_remaining(&self) -> Duration {
        Duration::from_secs(self.clock_remaining_secs)
    }
}

//! Trivia game engine - the synchronous per-session state machine.
//!
//! This module provides:
//! - Round phase sequencing (idle, loading, audio, betting, question, answer)
//! - Scoring, wager multipliers and combo rewards
//! - Power-card inventory and the seven card effects
//! - Targeted actions (steal targeting, precision quiz, challenge, resurrect)
//! - Roster and turn rotation
//! - Snapshots and the command surface

pub mod cards;
pub mod commands;
pub mod constants;
pub mod entities;
pub mod errors;
pub mod events;
mod resolver;
pub mod roster;
pub mod scoring;
pub mod session;
pub mod settings;
pub mod snapshot;
pub mod targeted;

pub use cards::{CardOutcome, Inventory, PowerCardInstance, PowerCardKind};
pub use commands::{CommandOutcome, SessionCommand};
pub use entities::{
    Bet, CardId, Difficulty, MediaRef, Player, PlayerId, Points, Question, QuestionId,
    QuestionType, Round, RoundPhase, SessionId, SessionStatus,
};
pub use errors::{
    ErrorKind, NotFound, SessionError, SessionResult, StateConflict, ValidationError,
    WagerRejection,
};
pub use events::{Directive, GameEvent, TimerKind};
pub use scoring::{Combo, PointsBreakdown, RoundResult, compute_points, wager_multiplier};
pub use session::Session;
pub use settings::GameSettings;
pub use snapshot::{FinalStandings, PlayerSnapshot, RoundSnapshot, SessionSnapshot, StandingEntry};
pub use targeted::{
    ChallengeKind, ChallengeStage, PrecisionQuestion, PrecisionResult, StealOutcome,
    TargetedAction, TargetedKind,
};

//! Error taxonomy for session commands.
//!
//! Every command either applies completely or fails with one of three
//! categories. Timer-driven transitions never produce errors.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use super::entities::{CardId, PlayerId, QuestionId, RoundPhase, SessionId, SessionStatus};
use super::targeted::TargetedKind;

/// Why a wager was refused.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum WagerRejection {
    TokenUnavailable,
    AlreadyPlaced,
}

impl fmt::Display for WagerRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::TokenUnavailable => "token not available",
            Self::AlreadyPlaced => "already wagered this round",
        };
        write!(f, "{repr}")
    }
}

/// The command was malformed for the current data.
#[derive(Clone, Debug, Deserialize, Eq, Error, PartialEq, Serialize)]
pub enum ValidationError {
    #[error("name must be at least {min} characters")]
    NameTooShort { min: usize },
    #[error("name must be at most {max} characters")]
    NameTooLong { max: usize },
    #[error("name {0:?} is already taken")]
    DuplicateName(String),
    #[error("roster is full ({max} players)")]
    RosterFull { max: usize },
    #[error("need {required}+ players, have {present}")]
    NotEnoughPlayers { required: usize, present: usize },
    #[error("card {card_id} is not owned by player {player_id}")]
    CardNotOwned { player_id: PlayerId, card_id: CardId },
    #[error("card {0} was already used")]
    CardAlreadyUsed(CardId),
    #[error("invalid wager of {token}: {reason}")]
    InvalidWager { token: u32, reason: WagerRejection },
    #[error("inventory is full ({cap} cards)")]
    InventoryFull { cap: usize },
    #[error("no player can be targeted")]
    NoValidTargets,
    #[error("player {0} is not a valid target")]
    InvalidTarget(PlayerId),
    #[error("no used card can be resurrected")]
    NothingToResurrect,
    #[error("precision quiz needs {expected} questions, got {got}")]
    PrecisionQuestionsUnavailable { expected: usize, got: usize },
    #[error("expected at most {expected} answers, got {got}")]
    TooManyAnswers { expected: usize, got: usize },
    #[error("question index {0} is out of range")]
    InvalidQuestionIndex(usize),
    #[error("question {0} was already asked this session")]
    DuplicateQuestion(QuestionId),
    #[error("invalid settings: {0}")]
    InvalidSettings(String),
}

/// The command is well formed but not allowed right now.
#[derive(Clone, Debug, Deserialize, Eq, Error, PartialEq, Serialize)]
pub enum StateConflict {
    #[error("session is {actual}, expected {expected}")]
    WrongStatus {
        expected: SessionStatus,
        actual: SessionStatus,
    },
    #[error("session is finished")]
    SessionFinished,
    #[error("round is in {actual} phase, expected {expected}")]
    WrongPhase {
        expected: RoundPhase,
        actual: RoundPhase,
    },
    #[error("a {0} action is pending")]
    TargetedActionPending(TargetedKind),
    #[error("no targeted action is pending")]
    NoTargetedAction,
    #[error("pending action is {actual}, expected {expected}")]
    WrongTargetedAction {
        expected: TargetedKind,
        actual: TargetedKind,
    },
    #[error("player {0} did not start the pending action")]
    NotInitiator(PlayerId),
}

/// An id in the command doesn't resolve.
#[derive(Clone, Debug, Deserialize, Eq, Error, PartialEq, Serialize)]
pub enum NotFound {
    #[error("session {0} not found")]
    Session(SessionId),
    #[error("player {0} not found")]
    Player(PlayerId),
    #[error("card {0} not found")]
    Card(CardId),
    #[error("target {0} not found")]
    Target(PlayerId),
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    StateConflict,
    NotFound,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Validation => "validation",
            Self::StateConflict => "state_conflict",
            Self::NotFound => "not_found",
        };
        write!(f, "{repr}")
    }
}

#[derive(Clone, Debug, Deserialize, Eq, Error, PartialEq, Serialize)]
pub enum SessionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    StateConflict(#[from] StateConflict),
    #[error(transparent)]
    NotFound(#[from] NotFound),
}

impl SessionError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::StateConflict(_) => ErrorKind::StateConflict,
            Self::NotFound(_) => ErrorKind::NotFound,
        }
    }
}

pub type SessionResult<T> = Result<T, SessionError>;

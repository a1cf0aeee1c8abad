use serde::{Deserialize, Serialize};
use std::{fmt, time::Duration};

use super::cards::PowerCardKind;
use super::entities::{CardId, MediaRef, PlayerId, Points, QuestionType, SessionStatus};
use super::scoring::Combo;
use super::snapshot::FinalStandings;
use super::targeted::{ChallengeStage, PrecisionResult, StealOutcome, TargetedKind};

/// Which countdown a timer belongs to. The game clock is not listed; it is
/// driven by a fixed interval in the actor.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerKind {
    Betting,
    Precision,
    Challenge,
}

impl fmt::Display for TimerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Betting => "betting",
            Self::Precision => "precision",
            Self::Challenge => "challenge",
        };
        write!(f, "{repr}")
    }
}

/// Work the session needs its collaborators to do. The pure state machine
/// only queues these; the actor executes them.
#[derive(Clone, Debug, PartialEq)]
pub enum Directive {
    /// Ask the catalog for the next round's question.
    FetchQuestion { generation: u64 },
    /// Hand media to the audio collaborator.
    PlayMedia {
        generation: u64,
        media: MediaRef,
        duration_hint: Duration,
    },
    /// Fire `timer` after `duration` unless the generation moved on.
    StartTimer {
        timer: TimerKind,
        generation: u64,
        duration: Duration,
    },
    /// Hand the final standings to the persistence collaborator.
    RecordStandings(FinalStandings),
}

/// Notable state changes, drained by the actor for logging and metrics.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GameEvent {
    PlayerJoined {
        player_id: PlayerId,
        name: String,
    },
    PlayerLeft {
        player_id: PlayerId,
        name: String,
    },
    StatusChanged {
        status: SessionStatus,
    },
    RoundRequested {
        round: u32,
    },
    RoundLoaded {
        round: u32,
        question_type: QuestionType,
    },
    BettingOpened {
        round: u32,
    },
    BetPlaced {
        player_id: PlayerId,
        amount: u32,
    },
    BettingClosed {
        round: u32,
    },
    PointsAwarded {
        player_id: PlayerId,
        points: Points,
    },
    NoWinner {
        round: u32,
    },
    RoundVoided {
        round: u32,
    },
    ComboTriggered {
        player_id: PlayerId,
        combo: Combo,
    },
    CardAcquired {
        player_id: PlayerId,
        card_id: CardId,
        kind: PowerCardKind,
    },
    CardPlayed {
        player_id: PlayerId,
        card_id: CardId,
        kind: PowerCardKind,
    },
    StealResolved {
        outcome: StealOutcome,
    },
    PrecisionScored {
        result: PrecisionResult,
    },
    ChallengeStageChanged {
        player_id: PlayerId,
        stage: ChallengeStage,
    },
    ChallengeJudged {
        player_id: PlayerId,
        completed: bool,
        points: Points,
    },
    CardResurrected {
        player_id: PlayerId,
        kind: PowerCardKind,
    },
    TargetedActionCancelled {
        player_id: PlayerId,
        action: TargetedKind,
    },
    ShieldDecayed {
        player_id: PlayerId,
    },
    TurnPassed {
        player_id: PlayerId,
    },
    GameFinished {
        winner: Option<PlayerId>,
    },
}

impl fmt::Display for GameEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PlayerJoined { player_id, name } => {
                write!(f, "{name} joined as player {player_id}")
            }
            Self::PlayerLeft { player_id, name } => {
                write!(f, "{name} (player {player_id}) left")
            }
            Self::StatusChanged { status } => write!(f, "session is now {status}"),
            Self::RoundRequested { round } => write!(f, "round {round} requested"),
            Self::RoundLoaded {
                round,
                question_type,
            } => write!(f, "round {round} loaded a {question_type} question"),
            Self::BettingOpened { round } => write!(f, "betting opened for round {round}"),
            Self::BetPlaced { player_id, amount } => {
                write!(f, "player {player_id} wagered {amount}")
            }
            Self::BettingClosed { round } => write!(f, "betting closed for round {round}"),
            Self::PointsAwarded { player_id, points } => {
                write!(f, "player {player_id} scored {points}")
            }
            Self::NoWinner { round } => write!(f, "nobody answered round {round}"),
            Self::RoundVoided { round } => write!(f, "round {round} voided"),
            Self::ComboTriggered { player_id, combo } => {
                write!(f, "player {player_id} triggered {combo}")
            }
            Self::CardAcquired {
                player_id,
                card_id,
                kind,
            } => write!(f, "player {player_id} acquired {kind} card {card_id}"),
            Self::CardPlayed {
                player_id,
                card_id,
                kind,
            } => write!(f, "player {player_id} played {kind} card {card_id}"),
            Self::StealResolved { outcome } => match outcome {
                StealOutcome::Blocked { attacker, victim } => {
                    write!(f, "player {victim} blocked a steal from player {attacker}")
                }
                StealOutcome::Reflected {
                    attacker, victim, ..
                } => write!(f, "player {victim} reflected a steal from player {attacker}"),
                StealOutcome::Transferred {
                    attacker,
                    victim,
                    card,
                } => write!(f, "player {attacker} stole a {card} card from player {victim}"),
            },
            Self::PrecisionScored { result } => write!(
                f,
                "player {} answered {}/{} precision questions",
                result.player_id, result.correct, result.total
            ),
            Self::ChallengeStageChanged { player_id, stage } => {
                write!(f, "player {player_id} challenge is {stage:?}")
            }
            Self::ChallengeJudged {
                player_id,
                completed,
                points,
            } => {
                let verdict = if *completed { "completed" } else { "failed" };
                write!(f, "player {player_id} {verdict} the challenge (+{points})")
            }
            Self::CardResurrected { player_id, kind } => {
                write!(f, "player {player_id} resurrected a {kind} card")
            }
            Self::TargetedActionCancelled { player_id, action } => {
                write!(f, "player {player_id} cancelled {action}")
            }
            Self::ShieldDecayed { player_id } => write!(f, "player {player_id} lost their shield"),
            Self::TurnPassed { player_id } => write!(f, "turn passed to player {player_id}"),
            Self::GameFinished { winner } => match winner {
                Some(winner) => write!(f, "game finished, player {winner} wins"),
                None => write!(f, "game finished without a winner"),
            },
        }
    }
}

//! Targeted actions: power-card uses that need further input before they
//! complete.
//!
//! Only one targeted action exists per session. While it is pending the
//! moderator can't advance the round; bets and bonus awards still go
//! through.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::cards::PowerCardKind;
use super::entities::{CardId, PlayerId, Points, normalize_answer};

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetedKind {
    StealTargeting,
    PrecisionQuiz,
    ChallengePerformance,
    ResurrectSelection,
}

impl fmt::Display for TargetedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::StealTargeting => "steal-targeting",
            Self::PrecisionQuiz => "precision-quiz",
            Self::ChallengePerformance => "challenge-performance",
            Self::ResurrectSelection => "resurrect-selection",
        };
        write!(f, "{repr}")
    }
}

/// A player that a pending steal may hit, with their defenses at the time
/// the steal was started.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct StealCandidate {
    pub player_id: PlayerId,
    pub card_count: usize,
    pub shielded: bool,
    pub counter_armed: bool,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct StealTargeting {
    pub attacker: PlayerId,
    pub card_id: CardId,
    pub candidates: Vec<StealCandidate>,
}

/// One question of a precision quiz. Accepted answers are never sent to
/// presentation clients.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct PrecisionQuestion {
    pub prompt: String,
    #[serde(skip_serializing, default)]
    pub answers: Vec<String>,
}

impl PrecisionQuestion {
    #[must_use]
    pub fn accepts(&self, answer: &str) -> bool {
        let answer = normalize_answer(answer);
        !answer.is_empty() && self.answers.iter().any(|a| normalize_answer(a) == answer)
    }
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct PrecisionQuiz {
    pub player_id: PlayerId,
    pub card_id: CardId,
    pub questions: Vec<PrecisionQuestion>,
    /// Answers recorded so far, by question index.
    pub answers: Vec<Option<String>>,
    pub countdown_secs: u64,
}

impl PrecisionQuiz {
    /// One point per correctly answered question. Missing answers count
    /// as wrong.
    #[must_use]
    pub fn grade(&self) -> PrecisionResult {
        let correct = self
            .questions
            .iter()
            .zip(&self.answers)
            .filter(|(q, a)| a.as_deref().is_some_and(|a| q.accepts(a)))
            .count() as u32;
        PrecisionResult {
            player_id: self.player_id,
            correct,
            total: self.questions.len() as u32,
            points: correct,
            timed_out: false,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct PrecisionResult {
    pub player_id: PlayerId,
    pub correct: u32,
    pub total: u32,
    pub points: Points,
    pub timed_out: bool,
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChallengeKind {
    SingAlong,
    HumTheTune,
    DanceMove,
    FinishTheLyric,
    AirInstrument,
}

impl ChallengeKind {
    pub const ALL: [ChallengeKind; 5] = [
        ChallengeKind::SingAlong,
        ChallengeKind::HumTheTune,
        ChallengeKind::DanceMove,
        ChallengeKind::FinishTheLyric,
        ChallengeKind::AirInstrument,
    ];

    #[must_use]
    pub fn instruction(self) -> &'static str {
        match self {
            Self::SingAlong => "Sing the chorus of the last song out loud",
            Self::HumTheTune => "Hum a song until someone at the table names it",
            Self::DanceMove => "Perform the signature dance move of a famous music video",
            Self::FinishTheLyric => "Finish the lyric the moderator starts",
            Self::AirInstrument => "Play an air-instrument solo for the whole countdown",
        }
    }
}

impl fmt::Display for ChallengeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::SingAlong => "sing-along",
            Self::HumTheTune => "hum-the-tune",
            Self::DanceMove => "dance-move",
            Self::FinishTheLyric => "finish-the-lyric",
            Self::AirInstrument => "air-instrument",
        };
        write!(f, "{repr}")
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChallengeStage {
    Preparing,
    Performing,
    AwaitingVerdict,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ChallengePerformance {
    pub player_id: PlayerId,
    pub card_id: CardId,
    pub kind: ChallengeKind,
    pub instruction: String,
    pub stage: ChallengeStage,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ResurrectCandidate {
    pub card_id: CardId,
    pub kind: PowerCardKind,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ResurrectSelection {
    pub player_id: PlayerId,
    pub card_id: CardId,
    pub candidates: Vec<ResurrectCandidate>,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum TargetedAction {
    StealTargeting(StealTargeting),
    PrecisionQuiz(PrecisionQuiz),
    ChallengePerformance(ChallengePerformance),
    ResurrectSelection(ResurrectSelection),
}

impl TargetedAction {
    #[must_use]
    pub fn kind(&self) -> TargetedKind {
        match self {
            Self::StealTargeting(_) => TargetedKind::StealTargeting,
            Self::PrecisionQuiz(_) => TargetedKind::PrecisionQuiz,
            Self::ChallengePerformance(_) => TargetedKind::ChallengePerformance,
            Self::ResurrectSelection(_) => TargetedKind::ResurrectSelection,
        }
    }

    /// The player who played the card.
    #[must_use]
    pub fn initiator(&self) -> PlayerId {
        match self {
            Self::StealTargeting(s) => s.attacker,
            Self::PrecisionQuiz(p) => p.player_id,
            Self::ChallengePerformance(c) => c.player_id,
            Self::ResurrectSelection(r) => r.player_id,
        }
    }

    /// The card reserved by this action.
    #[must_use]
    pub fn card_id(&self) -> CardId {
        match self {
            Self::StealTargeting(s) => s.card_id,
            Self::PrecisionQuiz(p) => p.card_id,
            Self::ChallengePerformance(c) => c.card_id,
            Self::ResurrectSelection(r) => r.card_id,
        }
    }
}

/// How an executed steal resolved. Exactly one of these happens per
/// execution.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum StealOutcome {
    /// The victim's shield absorbed the steal.
    Blocked { attacker: PlayerId, victim: PlayerId },
    /// The victim's counter turned the steal around. `card` is what moved
    /// from the attacker to the victim, if anything could.
    Reflected {
        attacker: PlayerId,
        victim: PlayerId,
        card: Option<PowerCardKind>,
    },
    Transferred {
        attacker: PlayerId,
        victim: PlayerId,
        card: PowerCardKind,
    },
}

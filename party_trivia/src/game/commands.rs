//! The command surface, as data.
//!
//! Commands arrive from the moderator device over any transport and are
//! applied one at a time by [`Session::apply`].

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{
    cards::{CardOutcome, PowerCardKind},
    entities::{Bet, CardId, PlayerId, Points, RoundPhase},
    errors::SessionResult,
    scoring::RoundResult,
    session::Session,
    targeted::{PrecisionResult, StealOutcome, TargetedKind},
};

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionCommand {
    AddPlayer {
        name: String,
    },
    RemovePlayer {
        player_id: PlayerId,
    },
    StartGame,
    Pause,
    Resume,
    RequestNextRound,
    /// Manual end-of-playback signal from the moderator device.
    PlaybackFinished,
    PlaceBet {
        player_id: PlayerId,
        token: u32,
    },
    CloseBetting,
    RevealAnswer {
        winner: Option<PlayerId>,
    },
    VoidRound,
    PrepareNextRound,
    AcquireCard {
        player_id: PlayerId,
        kind: PowerCardKind,
    },
    UsePowerCard {
        player_id: PlayerId,
        card_id: CardId,
    },
    SelectStealTarget {
        player_id: PlayerId,
        target_id: PlayerId,
    },
    AnswerPrecision {
        player_id: PlayerId,
        index: usize,
        answer: String,
    },
    SubmitPrecisionAnswers {
        player_id: PlayerId,
        answers: Vec<String>,
    },
    SubmitChallengeVerdict {
        completed: bool,
    },
    SelectResurrectCard {
        player_id: PlayerId,
        card_id: CardId,
    },
    CancelTargetedAction {
        player_id: PlayerId,
    },
    AwardBonus {
        player_id: PlayerId,
        points: Points,
    },
    EndSession,
}

impl SessionCommand {
    /// Stable label for logs and metrics.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::AddPlayer { .. } => "add_player",
            Self::RemovePlayer { .. } => "remove_player",
            Self::StartGame => "start_game",
            Self::Pause => "pause",
            Self::Resume => "resume",
            Self::RequestNextRound => "request_next_round",
            Self::PlaybackFinished => "playback_finished",
            Self::PlaceBet { .. } => "place_bet",
            Self::CloseBetting => "close_betting",
            Self::RevealAnswer { .. } => "reveal_answer",
            Self::VoidRound => "void_round",
            Self::PrepareNextRound => "prepare_next_round",
            Self::AcquireCard { .. } => "acquire_card",
            Self::UsePowerCard { .. } => "use_power_card",
            Self::SelectStealTarget { .. } => "select_steal_target",
            Self::AnswerPrecision { .. } => "answer_precision",
            Self::SubmitPrecisionAnswers { .. } => "submit_precision_answers",
            Self::SubmitChallengeVerdict { .. } => "submit_challenge_verdict",
            Self::SelectResurrectCard { .. } => "select_resurrect_card",
            Self::CancelTargetedAction { .. } => "cancel_targeted_action",
            Self::AwardBonus { .. } => "award_bonus",
            Self::EndSession => "end_session",
        }
    }
}

impl fmt::Display for SessionCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CommandOutcome {
    Done,
    PlayerAdded { player_id: PlayerId },
    RoundRequested { round: u32 },
    BetPlaced { bet: Bet },
    RoundResolved { result: RoundResult },
    CardAcquired { card_id: CardId },
    CardPlayed { outcome: CardOutcome },
    StealResolved { outcome: StealOutcome },
    PrecisionScored { result: PrecisionResult },
    ChallengeJudged { points: Points },
    CardResurrected { kind: PowerCardKind },
    ActionCancelled { action: TargetedKind },
}

impl Session {
    /// Applies one command. On error nothing changed.
    ///
    /// Precision cards played through here get no quiz questions and are
    /// rejected; the session actor fetches the questions first and calls
    /// [`Session::use_power_card`] directly.
    pub fn apply(&mut self, command: SessionCommand) -> SessionResult<CommandOutcome> {
        let outcome = match command {
            SessionCommand::AddPlayer { name } => CommandOutcome::PlayerAdded {
                player_id: self.add_player(&name)?,
            },
            SessionCommand::RemovePlayer { player_id } => {
                self.remove_player(player_id)?;
                CommandOutcome::Done
            }
            SessionCommand::StartGame => {
                self.start_game()?;
                CommandOutcome::Done
            }
            SessionCommand::Pause => {
                self.pause()?;
                CommandOutcome::Done
            }
            SessionCommand::Resume => {
                self.resume()?;
                CommandOutcome::Done
            }
            SessionCommand::RequestNextRound => CommandOutcome::RoundRequested {
                round: self.request_next_round()?,
            },
            SessionCommand::PlaybackFinished => {
                self.ensure_playing()?;
                self.ensure_no_targeted()?;
                self.ensure_phase(RoundPhase::Audio)?;
                self.playback_finished(self.phase_generation);
                CommandOutcome::Done
            }
            SessionCommand::PlaceBet { player_id, token } => CommandOutcome::BetPlaced {
                bet: self.place_bet(player_id, token)?,
            },
            SessionCommand::CloseBetting => {
                self.close_betting()?;
                CommandOutcome::Done
            }
            SessionCommand::RevealAnswer { winner } => CommandOutcome::RoundResolved {
                result: self.reveal_answer(winner)?,
            },
            SessionCommand::VoidRound => {
                self.void_round()?;
                CommandOutcome::Done
            }
            SessionCommand::PrepareNextRound => {
                self.prepare_next_round()?;
                CommandOutcome::Done
            }
            SessionCommand::AcquireCard { player_id, kind } => CommandOutcome::CardAcquired {
                card_id: self.acquire_card(player_id, kind)?,
            },
            SessionCommand::UsePowerCard { player_id, card_id } => CommandOutcome::CardPlayed {
                outcome: self.use_power_card(player_id, card_id, Vec::new())?,
            },
            SessionCommand::SelectStealTarget {
                player_id,
                target_id,
            } => CommandOutcome::StealResolved {
                outcome: self.select_steal_target(player_id, target_id)?,
            },
            SessionCommand::AnswerPrecision {
                player_id,
                index,
                answer,
            } => {
                self.answer_precision(player_id, index, answer)?;
                CommandOutcome::Done
            }
            SessionCommand::SubmitPrecisionAnswers { player_id, answers } => {
                CommandOutcome::PrecisionScored {
                    result: self.submit_precision_answers(player_id, answers)?,
                }
            }
            SessionCommand::SubmitChallengeVerdict { completed } => {
                CommandOutcome::ChallengeJudged {
                    points: self.submit_challenge_verdict(completed)?,
                }
            }
            SessionCommand::SelectResurrectCard { player_id, card_id } => {
                CommandOutcome::CardResurrected {
                    kind: self.select_resurrect_card(player_id, card_id)?,
                }
            }
            SessionCommand::CancelTargetedAction { player_id } => {
                CommandOutcome::ActionCancelled {
                    action: self.cancel_targeted_action(player_id)?,
                }
            }
            SessionCommand::AwardBonus { player_id, points } => {
                self.award_bonus(player_id, points)?;
                CommandOutcome::Done
            }
            SessionCommand::EndSession => {
                self.end_session()?;
                CommandOutcome::Done
            }
        };
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{
        entities::{Difficulty, MediaRef, Question, QuestionType},
        errors::{SessionError, StateConflict},
        settings::GameSettings,
    };
    use uuid::Uuid;

    #[test]
    fn test_command_json_shape() {
        let command: SessionCommand =
            serde_json::from_str(r#"{"type": "place_bet", "player_id": 1, "token": 2}"#).unwrap();
        assert_eq!(
            command,
            SessionCommand::PlaceBet {
                player_id: 1,
                token: 2
            }
        );
        let command: SessionCommand =
            serde_json::from_str(r#"{"type": "reveal_answer", "winner": null}"#).unwrap();
        assert_eq!(command, SessionCommand::RevealAnswer { winner: None });
    }

    #[test]
    fn test_apply_runs_lobby_commands() {
        let mut session =
            Session::new(Uuid::new_v4(), "cmd", GameSettings::default(), Some(2)).unwrap();
        let outcome = session
            .apply(SessionCommand::AddPlayer {
                name: "Ada".to_string(),
            })
            .unwrap();
        assert_eq!(outcome, CommandOutcome::PlayerAdded { player_id: 1 });
        session
            .apply(SessionCommand::AddPlayer {
                name: "Bob".to_string(),
            })
            .unwrap();
        session.apply(SessionCommand::StartGame).unwrap();
        let outcome = session.apply(SessionCommand::RequestNextRound).unwrap();
        assert_eq!(outcome, CommandOutcome::RoundRequested { round: 1 });
    }

    #[test]
    fn test_playback_finished_outside_audio() {
        let mut session =
            Session::new(Uuid::new_v4(), "cmd", GameSettings::default(), Some(2)).unwrap();
        session.add_player("Ada").unwrap();
        session.add_player("Bob").unwrap();
        session.start_game().unwrap();
        let err = session.apply(SessionCommand::PlaybackFinished).unwrap_err();
        assert!(matches!(err, SessionError::StateConflict(_)));
    }

    #[test]
    fn test_playback_finished_waits_for_targeted_action() {
        let mut session =
            Session::new(Uuid::new_v4(), "cmd", GameSettings::default(), Some(2)).unwrap();
        session.add_player("Ada").unwrap();
        session.add_player("Bob").unwrap();
        session.start_game().unwrap();
        let steal = session.acquire_card(1, PowerCardKind::Steal).unwrap();
        session.acquire_card(2, PowerCardKind::Boost).unwrap();

        session.request_next_round().unwrap();
        let generation = session.phase_generation();
        let question = Question {
            id: "q1".to_string(),
            question_type: QuestionType::Song,
            difficulty: Difficulty::Easy,
            text: "Name this song".to_string(),
            answers: vec!["Hey Jude".to_string()],
        };
        let media = MediaRef {
            uri: "preview.mp3".to_string(),
            duration_secs: None,
        };
        session.load_round(generation, question, Some(media)).unwrap();
        assert_eq!(session.phase(), RoundPhase::Audio);

        session
            .apply(SessionCommand::UsePowerCard {
                player_id: 1,
                card_id: steal,
            })
            .unwrap();
        let err = session.apply(SessionCommand::PlaybackFinished).unwrap_err();
        assert_eq!(
            err,
            StateConflict::TargetedActionPending(TargetedKind::StealTargeting).into()
        );
        assert_eq!(session.phase(), RoundPhase::Audio);

        session
            .apply(SessionCommand::CancelTargetedAction { player_id: 1 })
            .unwrap();
        session.apply(SessionCommand::PlaybackFinished).unwrap();
        assert_eq!(session.phase(), RoundPhase::Question);
    }

    #[test]
    fn test_outcome_json_keeps_nested_outcome() {
        let outcome = CommandOutcome::CardPlayed {
            outcome: CardOutcome::AwaitingInput {
                action: TargetedKind::StealTargeting,
            },
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["type"], "card_played");
        assert_eq!(json["outcome"]["effect"], "awaiting_input");
        assert_eq!(json["outcome"]["action"], "steal_targeting");

        let back: CommandOutcome = serde_json::from_value(json).unwrap();
        assert_eq!(back, outcome);
    }
}

//! Read-only views handed to presentation clients after every mutation.
//!
//! Accepted answers only appear once a round reaches the answer phase.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{
    cards::{PowerCardInstance, PowerCardKind},
    entities::{
        Bet, CardId, Difficulty, EffectFlags, MediaRef, Player, PlayerId, Points, QuestionType,
        Round, RoundPhase, SessionId, SessionStatus,
    },
    scoring::{compute_points, wager_multiplier},
    session::Session,
    targeted::TargetedAction,
};

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct CardView {
    pub id: CardId,
    pub kind: PowerCardKind,
}

impl From<&PowerCardInstance> for CardView {
    fn from(card: &PowerCardInstance) -> Self {
        Self {
            id: card.id,
            kind: card.kind,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct PlayerSnapshot {
    pub id: PlayerId,
    pub name: String,
    pub score: Points,
    pub tokens: Vec<u32>,
    pub wager: u32,
    pub multiplier: u32,
    /// What this player would earn for answering the current question.
    pub potential_points: Option<Points>,
    pub cards: Vec<CardView>,
    pub used_cards: Vec<CardView>,
    pub flags: EffectFlags,
    pub consecutive_correct: u32,
    pub is_current_turn: bool,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct RoundSnapshot {
    pub number: u32,
    pub phase: RoundPhase,
    pub question_type: Option<QuestionType>,
    pub difficulty: Option<Difficulty>,
    pub base_points: Option<Points>,
    /// Shown from the question phase on.
    pub text: Option<String>,
    /// Shown in the answer phase only.
    pub answers: Option<Vec<String>>,
    pub media: Option<MediaRef>,
    pub bets: Vec<Bet>,
    pub winner: Option<PlayerId>,
    pub no_correct_answer: bool,
    pub voided: bool,
}

impl From<&Round> for RoundSnapshot {
    fn from(round: &Round) -> Self {
        let question = round.question.as_ref();
        let shows_text = matches!(round.phase, RoundPhase::Question | RoundPhase::Answer);
        Self {
            number: round.number,
            phase: round.phase,
            question_type: question.map(|q| q.question_type),
            difficulty: question.map(|q| q.difficulty),
            base_points: question.map(|q| q.base_points()),
            text: question.filter(|_| shows_text).map(|q| q.text.clone()),
            answers: question
                .filter(|_| round.phase == RoundPhase::Answer)
                .map(|q| q.answers.clone()),
            media: round.media.clone(),
            bets: round.bets.clone(),
            winner: round.winner,
            no_correct_answer: round.no_correct_answer,
            voided: round.voided,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub id: SessionId,
    pub name: String,
    pub status: SessionStatus,
    pub round_counter: u32,
    pub clock_remaining_secs: u64,
    pub target_score: Points,
    pub current_turn: Option<PlayerId>,
    pub players: Vec<PlayerSnapshot>,
    pub round: Option<RoundSnapshot>,
    pub targeted_action: Option<TargetedAction>,
    pub winner: Option<PlayerId>,
}

/// One line of the final leaderboard. Tied scores share a rank.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct StandingEntry {
    pub rank: u32,
    pub player_id: PlayerId,
    pub name: String,
    pub score: Points,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct FinalStandings {
    pub session_id: SessionId,
    pub session_name: String,
    pub rounds_played: u32,
    pub winner: Option<PlayerId>,
    pub finished_at: DateTime<Utc>,
    pub entries: Vec<StandingEntry>,
}

impl Session {
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        let base = self
            .round
            .as_ref()
            .and_then(|r| r.question.as_ref())
            .map(|q| q.base_points());
        let current = self.current_turn();
        let players = self
            .roster
            .iter()
            .map(|p| player_snapshot(p, base, current == Some(p.id)))
            .collect();

        SessionSnapshot {
            id: self.id,
            name: self.name.clone(),
            status: self.status,
            round_counter: self.round_counter,
            clock_remaining_secs: self.clock_remaining_secs,
            target_score: self.settings.target_score,
            current_turn: current,
            players,
            round: self.round.as_ref().map(RoundSnapshot::from),
            targeted_action: self.targeted.clone(),
            winner: self.winner,
        }
    }
}

fn player_snapshot(player: &Player, base: Option<Points>, is_current_turn: bool) -> PlayerSnapshot {
    PlayerSnapshot {
        id: player.id,
        name: player.name.clone(),
        score: player.score,
        tokens: player.tokens.iter().collect(),
        wager: player.wager,
        multiplier: wager_multiplier(player.wager),
        potential_points: base.map(|b| compute_points(b, player.flags.boosted, player.wager).total),
        cards: player.inventory.iter().map(CardView::from).collect(),
        used_cards: player.used_cards.iter().map(CardView::from).collect(),
        flags: player.flags,
        consecutive_correct: player.streaks.consecutive,
        is_current_turn,
    }
}

#[cfg(test)]
mod tests {
    use crate::game::{
        cards::PowerCardKind,
        entities::{Difficulty, Question, QuestionType, RoundPhase},
        session::Session,
        settings::GameSettings,
    };
    use uuid::Uuid;

    fn playing_session() -> Session {
        let mut session =
            Session::new(Uuid::new_v4(), "snap", GameSettings::default(), Some(5)).unwrap();
        session.add_player("Ada").unwrap();
        session.add_player("Bob").unwrap();
        session.start_game().unwrap();
        session
    }

    fn question() -> Question {
        Question {
            id: "q-album".to_string(),
            question_type: QuestionType::Album,
            difficulty: Difficulty::Easy,
            text: "Which album is this from?".to_string(),
            answers: vec!["Abbey Road".to_string()],
        }
    }

    #[test]
    fn test_answers_hidden_until_answer_phase() {
        let mut session = playing_session();
        session.request_next_round().unwrap();
        let generation = session.phase_generation();
        session.load_round(generation, question(), None).unwrap();

        let round = session.snapshot().round.unwrap();
        assert_eq!(round.phase, RoundPhase::Question);
        assert!(round.text.is_some());
        assert!(round.answers.is_none());
        let json = serde_json::to_string(&session.snapshot()).unwrap();
        assert!(!json.contains("Abbey Road"));

        session.reveal_answer(None).unwrap();
        let round = session.snapshot().round.unwrap();
        assert_eq!(round.answers, Some(vec!["Abbey Road".to_string()]));
    }

    #[test]
    fn test_potential_points_match_award() {
        let mut session = playing_session();
        let boost = session.acquire_card(1, PowerCardKind::Boost).unwrap();
        session.use_power_card(1, boost, Vec::new()).unwrap();
        session.request_next_round().unwrap();
        let generation = session.phase_generation();
        session.load_round(generation, question(), None).unwrap();

        let snapshot = session.snapshot();
        let potential = snapshot.players[0].potential_points.unwrap();
        assert_eq!(potential, 4);
        assert!(snapshot.players[0].is_current_turn);

        let result = session.reveal_answer(Some(1)).unwrap();
        assert_eq!(result.points.unwrap().total, potential);
    }
}

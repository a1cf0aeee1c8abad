use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeSet, HashMap},
    fmt,
};
use uuid::Uuid;

use super::cards::{Inventory, PowerCardInstance};
use super::scoring;

/// Sessions are addressed by a random UUID so ids never collide across
/// server restarts.
pub type SessionId = Uuid;

/// Players are numbered per session in join order.
pub type PlayerId = u32;

/// Card instance ids are unique within a session.
pub type CardId = u64;

/// Catalog-assigned question identifier.
pub type QuestionId = String;

/// Whole points. Scores only ever grow.
pub type Points = u32;

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    Song,
    Artist,
    Album,
    Year,
    Lyrics,
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Song => "song",
            Self::Artist => "artist",
            Self::Album => "album",
            Self::Year => "year",
            Self::Lyrics => "lyrics",
        };
        write!(f, "{repr}")
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// The tier that counts towards the hard-hitter combo.
    pub const HARDEST: Difficulty = Difficulty::Hard;
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        };
        write!(f, "{repr}")
    }
}

/// Lowercases, drops punctuation and collapses whitespace so that
/// "  The Beatles!" and "the beatles" compare equal.
pub fn normalize_answer(answer: &str) -> String {
    answer
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect::<String>()
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// A trivia question as delivered by the catalog.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Question {
    pub id: QuestionId,
    pub question_type: QuestionType,
    pub difficulty: Difficulty,
    pub text: String,
    /// Every accepted spelling of the answer.
    pub answers: Vec<String>,
}

impl Question {
    #[must_use]
    pub fn base_points(&self) -> Points {
        scoring::question_base_points(self.question_type, self.difficulty)
    }
}

/// Reference to a playable track preview.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct MediaRef {
    pub uri: String,
    #[serde(default)]
    pub duration_secs: Option<u64>,
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Created,
    Playing,
    Paused,
    Finished,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Created => "created",
            Self::Playing => "playing",
            Self::Paused => "paused",
            Self::Finished => "finished",
        };
        write!(f, "{repr}")
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundPhase {
    Idle,
    Loading,
    Audio,
    Betting,
    Question,
    Answer,
}

impl fmt::Display for RoundPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Audio => "audio",
            Self::Betting => "betting",
            Self::Question => "question",
            Self::Answer => "answer",
        };
        write!(f, "{repr}")
    }
}

/// A single player's wager for the current round.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Bet {
    pub player_id: PlayerId,
    pub amount: u32,
    pub multiplier: u32,
}

impl Bet {
    #[must_use]
    pub fn new(player_id: PlayerId, amount: u32) -> Self {
        Self {
            player_id,
            amount,
            multiplier: scoring::wager_multiplier(amount),
        }
    }
}

impl fmt::Display for Bet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "player {} wagered {} ({}x)",
            self.player_id, self.amount, self.multiplier
        )
    }
}

/// The round currently being played. Dropped when the next round is
/// prepared.
#[derive(Clone, Debug)]
pub struct Round {
    pub number: u32,
    pub phase: RoundPhase,
    pub question: Option<Question>,
    pub media: Option<MediaRef>,
    pub bets: Vec<Bet>,
    pub winner: Option<PlayerId>,
    pub no_correct_answer: bool,
    pub voided: bool,
}

impl Round {
    #[must_use]
    pub fn new(number: u32) -> Self {
        Self {
            number,
            phase: RoundPhase::Loading,
            question: None,
            media: None,
            bets: Vec::new(),
            winner: None,
            no_correct_answer: false,
            voided: false,
        }
    }

    #[must_use]
    pub fn offers_betting(&self) -> bool {
        self.number >= super::constants::FIRST_BETTING_ROUND
    }
}

/// The wager tokens a player can still spend this game.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct WagerTokens(BTreeSet<u32>);

impl WagerTokens {
    pub fn new(tokens: impl IntoIterator<Item = u32>) -> Self {
        Self(tokens.into_iter().filter(|t| *t > 0).collect())
    }

    #[must_use]
    pub fn contains(&self, token: u32) -> bool {
        self.0.contains(&token)
    }

    /// Removes the token, returning whether it was available.
    pub fn spend(&mut self, token: u32) -> bool {
        self.0.remove(&token)
    }

    /// Puts a token back, returning whether it was missing.
    pub fn restore(&mut self, token: u32) -> bool {
        token > 0 && self.0.insert(token)
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.0.iter().copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Persistent power-card effects on a player.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct EffectFlags {
    /// Doubles the base points of the next won question.
    pub boosted: bool,
    /// Blocks the next incoming steal.
    pub shielded: bool,
    /// Reverses the next incoming steal.
    pub counter_armed: bool,
}

/// Streak counters driving combo detection.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Streaks {
    pub consecutive: u32,
    pub by_type: HashMap<QuestionType, u32>,
    pub by_difficulty: HashMap<Difficulty, u32>,
}

impl Streaks {
    /// Counts a correct answer. A win in a different category breaks the
    /// same-category streaks.
    pub fn record_win(&mut self, question_type: QuestionType, difficulty: Difficulty) {
        self.consecutive += 1;
        self.by_type.retain(|t, _| *t == question_type);
        *self.by_type.entry(question_type).or_default() += 1;
        self.by_difficulty.retain(|d, _| *d == difficulty);
        *self.by_difficulty.entry(difficulty).or_default() += 1;
    }

    #[must_use]
    pub fn type_streak(&self, question_type: QuestionType) -> u32 {
        self.by_type.get(&question_type).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn difficulty_streak(&self, difficulty: Difficulty) -> u32 {
        self.by_difficulty.get(&difficulty).copied().unwrap_or(0)
    }
}

#[derive(Clone, Debug)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub score: Points,
    pub tokens: WagerTokens,
    /// Token wagered on the current round, 0 if none.
    pub wager: u32,
    pub inventory: Inventory,
    /// Cards this player has played, oldest first. Resurrect draws from
    /// here.
    pub used_cards: Vec<PowerCardInstance>,
    pub flags: EffectFlags,
    pub streaks: Streaks,
}

impl Player {
    #[must_use]
    pub fn new(id: PlayerId, name: String, tokens: WagerTokens, inventory_cap: usize) -> Self {
        Self {
            id,
            name,
            score: 0,
            tokens,
            wager: 0,
            inventory: Inventory::new(inventory_cap),
            used_cards: Vec::new(),
            flags: EffectFlags::default(),
            streaks: Streaks::default(),
        }
    }

    /// Adds points. Scores never decrease.
    pub fn add_points(&mut self, points: Points) {
        self.score = self.score.saturating_add(points);
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} pts)", self.name, self.score)
    }
}

//! Power cards: the seven card kinds, owned instances, the capped
//! inventory and the per-kind activation handlers.
//!
//! A card's behavior is chosen exactly once, when it is played, by
//! converting its [`PowerCardKind`] into a [`CardHandler`]. Each handler
//! either applies an instant effect or opens a targeted action that
//! suspends the round until it resolves.

use chrono::{DateTime, Utc};
use enum_dispatch::enum_dispatch;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{
    entities::{CardId, PlayerId},
    errors::{SessionResult, ValidationError},
    events::{Directive, GameEvent, TimerKind},
    session::Session,
    targeted::{
        ChallengeKind, ChallengePerformance, ChallengeStage, PrecisionQuestion, PrecisionQuiz,
        ResurrectCandidate, ResurrectSelection, StealTargeting, TargetedAction, TargetedKind,
    },
};

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerCardKind {
    Boost,
    Steal,
    Shield,
    Counter,
    Precision,
    Challenge,
    Resurrect,
}

impl PowerCardKind {
    pub const ALL: [PowerCardKind; 7] = [
        PowerCardKind::Boost,
        PowerCardKind::Steal,
        PowerCardKind::Shield,
        PowerCardKind::Counter,
        PowerCardKind::Precision,
        PowerCardKind::Challenge,
        PowerCardKind::Resurrect,
    ];

    pub(crate) fn handler(self) -> CardHandler {
        match self {
            Self::Boost => BoostEffect.into(),
            Self::Steal => StealEffect.into(),
            Self::Shield => ShieldEffect.into(),
            Self::Counter => CounterEffect.into(),
            Self::Precision => PrecisionEffect.into(),
            Self::Challenge => ChallengeEffect.into(),
            Self::Resurrect => ResurrectEffect.into(),
        }
    }
}

impl fmt::Display for PowerCardKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Boost => "boost",
            Self::Steal => "steal",
            Self::Shield => "shield",
            Self::Counter => "counter",
            Self::Precision => "precision",
            Self::Challenge => "challenge",
            Self::Resurrect => "resurrect",
        };
        write!(f, "{repr}")
    }
}

/// A card owned by exactly one player.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct PowerCardInstance {
    pub id: CardId,
    pub kind: PowerCardKind,
    pub is_used: bool,
    pub acquired_at: DateTime<Utc>,
    pub used_at: Option<DateTime<Utc>>,
}

impl PowerCardInstance {
    #[must_use]
    pub fn new(id: CardId, kind: PowerCardKind) -> Self {
        Self {
            id,
            kind,
            is_used: false,
            acquired_at: Utc::now(),
            used_at: None,
        }
    }

    pub fn mark_used(&mut self) {
        self.is_used = true;
        self.used_at = Some(Utc::now());
    }
}

/// Unused cards in a player's hand. Never holds more than `cap` cards.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Inventory {
    cards: Vec<PowerCardInstance>,
    cap: usize,
}

impl Inventory {
    #[must_use]
    pub fn new(cap: usize) -> Self {
        Self {
            cards: Vec::with_capacity(cap),
            cap,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.cards.len() >= self.cap
    }

    #[must_use]
    pub fn cap(&self) -> usize {
        self.cap
    }

    pub fn iter(&self) -> impl Iterator<Item = &PowerCardInstance> {
        self.cards.iter()
    }

    #[must_use]
    pub fn get(&self, id: CardId) -> Option<&PowerCardInstance> {
        self.cards.iter().find(|c| c.id == id)
    }

    #[must_use]
    pub fn contains(&self, id: CardId) -> bool {
        self.get(id).is_some()
    }

    pub fn insert(&mut self, card: PowerCardInstance) -> Result<(), ValidationError> {
        if self.is_full() {
            return Err(ValidationError::InventoryFull { cap: self.cap });
        }
        self.cards.push(card);
        Ok(())
    }

    pub fn take(&mut self, id: CardId) -> Option<PowerCardInstance> {
        let idx = self.cards.iter().position(|c| c.id == id)?;
        Some(self.cards.remove(idx))
    }

    /// Removes a pseudo-randomly chosen card.
    pub fn take_random<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<PowerCardInstance> {
        if self.cards.is_empty() {
            return None;
        }
        let idx = rng.random_range(0..self.cards.len());
        Some(self.cards.remove(idx))
    }
}

/// What playing a card did immediately.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum CardOutcome {
    Boosted { already_boosted: bool },
    Shielded,
    CounterArmed,
    /// The card opened a targeted action; it stays in the inventory until
    /// the action resolves.
    AwaitingInput { action: TargetedKind },
}

/// A card being played, with any collaborator-provided input.
#[derive(Debug)]
pub(crate) struct CardPlay {
    pub player_id: PlayerId,
    pub card_id: CardId,
    pub precision_questions: Vec<PrecisionQuestion>,
}

#[enum_dispatch]
pub(crate) trait CardEffect {
    fn activate(&self, session: &mut Session, play: CardPlay) -> SessionResult<CardOutcome>;
}

#[enum_dispatch(CardEffect)]
pub(crate) enum CardHandler {
    BoostEffect,
    StealEffect,
    ShieldEffect,
    CounterEffect,
    PrecisionEffect,
    ChallengeEffect,
    ResurrectEffect,
}

pub(crate) struct BoostEffect;
pub(crate) struct StealEffect;
pub(crate) struct ShieldEffect;
pub(crate) struct CounterEffect;
pub(crate) struct PrecisionEffect;
pub(crate) struct ChallengeEffect;
pub(crate) struct ResurrectEffect;

impl CardEffect for BoostEffect {
    fn activate(&self, session: &mut Session, play: CardPlay) -> SessionResult<CardOutcome> {
        session.consume_card(play.player_id, play.card_id)?;
        let player = session.player_mut(play.player_id)?;
        let already_boosted = player.flags.boosted;
        player.flags.boosted = true;
        Ok(CardOutcome::Boosted { already_boosted })
    }
}

impl CardEffect for ShieldEffect {
    fn activate(&self, session: &mut Session, play: CardPlay) -> SessionResult<CardOutcome> {
        session.consume_card(play.player_id, play.card_id)?;
        session.player_mut(play.player_id)?.flags.shielded = true;
        Ok(CardOutcome::Shielded)
    }
}

impl CardEffect for CounterEffect {
    fn activate(&self, session: &mut Session, play: CardPlay) -> SessionResult<CardOutcome> {
        session.consume_card(play.player_id, play.card_id)?;
        session.player_mut(play.player_id)?.flags.counter_armed = true;
        Ok(CardOutcome::CounterArmed)
    }
}

impl CardEffect for StealEffect {
    fn activate(&self, session: &mut Session, play: CardPlay) -> SessionResult<CardOutcome> {
        let candidates = session.steal_candidates(play.player_id);
        if candidates.is_empty() {
            return Err(ValidationError::NoValidTargets.into());
        }
        session.begin_targeted(TargetedAction::StealTargeting(StealTargeting {
            attacker: play.player_id,
            card_id: play.card_id,
            candidates,
        }));
        Ok(CardOutcome::AwaitingInput {
            action: TargetedKind::StealTargeting,
        })
    }
}

impl CardEffect for PrecisionEffect {
    fn activate(&self, session: &mut Session, play: CardPlay) -> SessionResult<CardOutcome> {
        let expected = session.settings().precision_questions;
        if play.precision_questions.len() != expected {
            return Err(ValidationError::PrecisionQuestionsUnavailable {
                expected,
                got: play.precision_questions.len(),
            }
            .into());
        }

        let countdown_secs = session.settings().precision_secs;
        let answers = vec![None; expected];
        session.begin_targeted(TargetedAction::PrecisionQuiz(PrecisionQuiz {
            player_id: play.player_id,
            card_id: play.card_id,
            questions: play.precision_questions,
            answers,
            countdown_secs,
        }));
        session.start_action_timer(TimerKind::Precision, countdown_secs);
        Ok(CardOutcome::AwaitingInput {
            action: TargetedKind::PrecisionQuiz,
        })
    }
}

impl CardEffect for ChallengeEffect {
    fn activate(&self, session: &mut Session, play: CardPlay) -> SessionResult<CardOutcome> {
        let idx = session.rng.random_range(0..ChallengeKind::ALL.len());
        let kind = ChallengeKind::ALL[idx];
        let prepare_secs = session.settings().challenge_prepare_secs;
        session.begin_targeted(TargetedAction::ChallengePerformance(ChallengePerformance {
            player_id: play.player_id,
            card_id: play.card_id,
            kind,
            instruction: kind.instruction().to_string(),
            stage: ChallengeStage::Preparing,
        }));
        session.start_action_timer(TimerKind::Challenge, prepare_secs);
        Ok(CardOutcome::AwaitingInput {
            action: TargetedKind::ChallengePerformance,
        })
    }
}

impl CardEffect for ResurrectEffect {
    fn activate(&self, session: &mut Session, play: CardPlay) -> SessionResult<CardOutcome> {
        let candidates: Vec<ResurrectCandidate> = session
            .player(play.player_id)?
            .used_cards
            .iter()
            .filter(|c| c.kind != PowerCardKind::Resurrect)
            .map(|c| ResurrectCandidate {
                card_id: c.id,
                kind: c.kind,
            })
            .collect();
        if candidates.is_empty() {
            return Err(ValidationError::NothingToResurrect.into());
        }
        session.begin_targeted(TargetedAction::ResurrectSelection(ResurrectSelection {
            player_id: play.player_id,
            card_id: play.card_id,
            candidates,
        }));
        Ok(CardOutcome::AwaitingInput {
            action: TargetedKind::ResurrectSelection,
        })
    }
}

impl Session {
    /// Plays a card from the player's inventory.
    ///
    /// Instant cards are consumed here. Targeted cards stay in the
    /// inventory until their action executes; cancelling returns them
    /// untouched.
    pub(crate) fn play_card(&mut self, play: CardPlay) -> SessionResult<CardOutcome> {
        let kind = self.owned_card_kind(play.player_id, play.card_id)?;
        let player_id = play.player_id;
        let card_id = play.card_id;
        let outcome = kind.handler().activate(self, play)?;
        self.push_event(GameEvent::CardPlayed {
            player_id,
            card_id,
            kind,
        });
        Ok(outcome)
    }

    pub(crate) fn start_action_timer(&mut self, timer: TimerKind, secs: u64) {
        self.push_directive(Directive::StartTimer {
            timer,
            generation: self.action_generation,
            duration: std::time::Duration::from_secs(secs),
        });
    }
}

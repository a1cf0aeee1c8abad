//! Point computation, wager multipliers and combo rewards.
//!
//! Awarded points and the potential points shown to presentation clients
//! both come from [`compute_points`].

use log::debug;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{
    cards::{PowerCardInstance, PowerCardKind},
    constants::{
        HARD_HITTER_THRESHOLD, HOT_STREAK_THRESHOLD, TYPE_SPECIALIST_BONUS,
        TYPE_SPECIALIST_THRESHOLD,
    },
    entities::{Difficulty, PlayerId, Points, QuestionType, Streaks},
    errors::{NotFound, SessionResult},
    events::GameEvent,
    session::Session,
};

/// Base value of a question before boosts and wagers.
#[must_use]
pub fn question_base_points(question_type: QuestionType, difficulty: Difficulty) -> Points {
    let by_type = match question_type {
        QuestionType::Song | QuestionType::Artist => 1,
        QuestionType::Album | QuestionType::Year => 2,
        QuestionType::Lyrics => 3,
    };
    let by_difficulty = match difficulty {
        Difficulty::Easy => 0,
        Difficulty::Medium => 1,
        Difficulty::Hard => 2,
    };
    by_type + by_difficulty
}

/// Display multiplier for a wager: 1 token is 2x, 2 is 3x, 3 or more is 4x.
#[must_use]
pub fn wager_multiplier(amount: u32) -> u32 {
    match amount {
        0 => 1,
        1 => 2,
        2 => 3,
        _ => 4,
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct PointsBreakdown {
    pub base: Points,
    pub boosted: bool,
    pub wager_bonus: Points,
    pub total: Points,
}

/// `base` is doubled when boosted, then the wager is added on top.
#[must_use]
pub fn compute_points(base: Points, boosted: bool, wager: u32) -> PointsBreakdown {
    let base = if boosted { base.saturating_mul(2) } else { base };
    PointsBreakdown {
        base,
        boosted,
        wager_bonus: wager,
        total: base.saturating_add(wager),
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(tag = "combo", rename_all = "snake_case")]
pub enum Combo {
    /// Three correct answers in a row. Returns a spent wager token.
    HotStreak,
    /// Three wins in the same category. Bonus points.
    TypeSpecialist { question_type: QuestionType },
    /// Two wins at the hardest difficulty. An extra power card.
    HardHitter,
}

impl fmt::Display for Combo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HotStreak => write!(f, "hot streak"),
            Self::TypeSpecialist { question_type } => write!(f, "{question_type} specialist"),
            Self::HardHitter => write!(f, "hard hitter"),
        }
    }
}

/// Combos a player's streaks qualify for after winning a question of the
/// given category.
#[must_use]
pub fn detect_combos(
    streaks: &Streaks,
    question_type: QuestionType,
    difficulty: Difficulty,
) -> Vec<Combo> {
    let mut combos = Vec::new();
    if streaks.consecutive >= HOT_STREAK_THRESHOLD {
        combos.push(Combo::HotStreak);
    }
    if streaks.type_streak(question_type) >= TYPE_SPECIALIST_THRESHOLD {
        combos.push(Combo::TypeSpecialist { question_type });
    }
    if difficulty == Difficulty::HARDEST
        && streaks.difficulty_streak(difficulty) >= HARD_HITTER_THRESHOLD
    {
        combos.push(Combo::HardHitter);
    }
    combos
}

/// Everything a resolved round produced.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct RoundResult {
    pub round: u32,
    pub winner: Option<PlayerId>,
    pub points: Option<PointsBreakdown>,
    pub combos: Vec<Combo>,
}

impl Session {
    /// Awards the current question to `winner` and applies all round-end
    /// side effects: streaks, wager clearing, turn rotation and combos.
    pub(crate) fn award_points(
        &mut self,
        winner: PlayerId,
        question_type: QuestionType,
        difficulty: Difficulty,
    ) -> SessionResult<(PointsBreakdown, Vec<Combo>)> {
        let base = question_base_points(question_type, difficulty);
        let player = self.player_mut(winner)?;
        let breakdown = compute_points(base, player.flags.boosted, player.wager);
        player.flags.boosted = false;
        player.add_points(breakdown.total);
        player.streaks.record_win(question_type, difficulty);

        for other in self.roster.iter_mut().filter(|p| p.id != winner) {
            other.streaks.consecutive = 0;
        }
        self.clear_wagers();
        self.push_event(GameEvent::PointsAwarded {
            player_id: winner,
            points: breakdown.total,
        });

        self.rotate_turn();

        let combos = {
            let player = self.player(winner)?;
            detect_combos(&player.streaks, question_type, difficulty)
        };
        for combo in &combos {
            self.apply_combo(winner, *combo)?;
        }

        Ok((breakdown, combos))
    }

    fn apply_combo(&mut self, player_id: PlayerId, combo: Combo) -> SessionResult<()> {
        let smallest_missing = self
            .settings()
            .starting_tokens
            .iter()
            .copied()
            .filter(|t| {
                self.roster
                    .get(player_id)
                    .is_some_and(|p| !p.tokens.contains(*t))
            })
            .min();
        let bonus_card = if combo == Combo::HardHitter {
            let kind = PowerCardKind::ALL[self.rng.random_range(0..PowerCardKind::ALL.len())];
            Some(PowerCardInstance::new(self.next_card_id(), kind))
        } else {
            None
        };

        let player = self
            .roster
            .get_mut(player_id)
            .ok_or(NotFound::Player(player_id))?;
        match combo {
            Combo::HotStreak => {
                if let Some(token) = smallest_missing {
                    player.tokens.restore(token);
                }
                player.streaks.consecutive = 0;
            }
            Combo::TypeSpecialist { question_type } => {
                player.add_points(TYPE_SPECIALIST_BONUS);
                player.streaks.by_type.remove(&question_type);
            }
            Combo::HardHitter => {
                if let Some(card) = bonus_card
                    && player.inventory.insert(card).is_err()
                {
                    debug!("player {player_id} has no room for a hard hitter card");
                }
                player.streaks.by_difficulty.remove(&Difficulty::HARDEST);
            }
        }

        debug!("player {player_id} earned {combo}");
        self.push_event(GameEvent::ComboTriggered { player_id, combo });
        Ok(())
    }

    /// Drops every wager without refunding tokens.
    pub(crate) fn clear_wagers(&mut self) {
        for player in self.roster.iter_mut() {
            player.wager = 0;
        }
        if let Some(round) = self.round.as_mut() {
            round.bets.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_points_table() {
        assert_eq!(question_base_points(QuestionType::Song, Difficulty::Easy), 1);
        assert_eq!(question_base_points(QuestionType::Album, Difficulty::Easy), 2);
        assert_eq!(question_base_points(QuestionType::Lyrics, Difficulty::Hard), 5);
    }

    #[test]
    fn test_wager_multiplier_table() {
        assert_eq!(wager_multiplier(0), 1);
        assert_eq!(wager_multiplier(1), 2);
        assert_eq!(wager_multiplier(2), 3);
        assert_eq!(wager_multiplier(3), 4);
        assert_eq!(wager_multiplier(10), 4);
    }

    #[test]
    fn test_compute_points_boost_and_wager() {
        let breakdown = compute_points(2, true, 2);
        assert_eq!(breakdown.base, 4);
        assert_eq!(breakdown.wager_bonus, 2);
        assert_eq!(breakdown.total, 6);

        assert_eq!(compute_points(3, false, 0).total, 3);
    }

    #[test]
    fn test_detect_hot_streak() {
        let mut streaks = Streaks::default();
        for question_type in [QuestionType::Song, QuestionType::Year, QuestionType::Album] {
            streaks.record_win(question_type, Difficulty::Easy);
        }
        let combos = detect_combos(&streaks, QuestionType::Album, Difficulty::Easy);
        assert_eq!(combos, vec![Combo::HotStreak]);
    }

    #[test]
    fn test_detect_type_specialist_and_hard_hitter() {
        let mut streaks = Streaks::default();
        streaks.record_win(QuestionType::Lyrics, Difficulty::Hard);
        let combos = detect_combos(&streaks, QuestionType::Lyrics, Difficulty::Hard);
        assert!(combos.is_empty());

        streaks.record_win(QuestionType::Lyrics, Difficulty::Hard);
        let combos = detect_combos(&streaks, QuestionType::Lyrics, Difficulty::Hard);
        assert_eq!(combos, vec![Combo::HardHitter]);

        streaks.record_win(QuestionType::Lyrics, Difficulty::Hard);
        let combos = detect_combos(&streaks, QuestionType::Lyrics, Difficulty::Hard);
        assert!(combos.contains(&Combo::HotStreak));
        assert!(combos.contains(&Combo::TypeSpecialist {
            question_type: QuestionType::Lyrics
        }));
        assert!(combos.contains(&Combo::HardHitter));
    }

    #[test]
    fn test_medium_streak_is_not_hard_hitter() {
        let mut streaks = Streaks::default();
        streaks.record_win(QuestionType::Song, Difficulty::Medium);
        streaks.record_win(QuestionType::Artist, Difficulty::Medium);
        let combos = detect_combos(&streaks, QuestionType::Artist, Difficulty::Medium);
        assert!(combos.is_empty());
    }
}

//! Per-session game rules.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::constants::{
    DEFAULT_BETTING_SECS, DEFAULT_CHALLENGE_BONUS, DEFAULT_CHALLENGE_PERFORM_SECS,
    DEFAULT_CHALLENGE_PREPARE_SECS, DEFAULT_GAME_CLOCK_SECS, DEFAULT_INVENTORY_CAP,
    DEFAULT_MAX_PLAYERS, DEFAULT_PLAYBACK_HINT, DEFAULT_PRECISION_SECS,
    DEFAULT_SHIELD_DECAY_CHANCE, DEFAULT_STARTING_TOKENS, DEFAULT_TARGET_SCORE, MAX_NAME_LENGTH,
    MIN_NAME_LENGTH, MIN_PLAYERS, PRECISION_QUESTION_COUNT,
};
use super::entities::Points;
use super::errors::ValidationError;

/// Game rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameSettings {
    /// Roster cap (default: 8)
    pub max_players: usize,

    /// Players required to start a round (default: 2)
    pub min_players: usize,

    /// Display name length bounds, in characters
    pub min_name_len: usize,
    pub max_name_len: usize,

    /// Power-card inventory cap (default: 5)
    pub inventory_cap: usize,

    /// Wager tokens every player starts with (default: {1, 2, 3})
    pub starting_tokens: Vec<u32>,

    /// Reaching this score ends the game (default: 30)
    pub target_score: Points,

    /// Total game clock in seconds (default: 30 minutes)
    pub game_clock_secs: u64,

    /// Betting countdown (default: 15s)
    pub betting_secs: u64,

    /// Precision quiz countdown and question count (default: 15s, 3)
    pub precision_secs: u64,
    pub precision_questions: usize,

    /// Challenge preparation and performance countdowns
    pub challenge_prepare_secs: u64,
    pub challenge_perform_secs: u64,

    /// Points for a completed challenge (default: 3)
    pub challenge_bonus: Points,

    /// Chance that a shield wears off on each turn rotation
    pub shield_decay_chance: f64,

    /// Duration hint passed to the audio collaborator when the media has no
    /// known length
    pub playback_hint_secs: u64,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            max_players: DEFAULT_MAX_PLAYERS,
            min_players: MIN_PLAYERS,
            min_name_len: MIN_NAME_LENGTH,
            max_name_len: MAX_NAME_LENGTH,
            inventory_cap: DEFAULT_INVENTORY_CAP,
            starting_tokens: DEFAULT_STARTING_TOKENS.to_vec(),
            target_score: DEFAULT_TARGET_SCORE,
            game_clock_secs: DEFAULT_GAME_CLOCK_SECS,
            betting_secs: DEFAULT_BETTING_SECS,
            precision_secs: DEFAULT_PRECISION_SECS,
            precision_questions: PRECISION_QUESTION_COUNT,
            challenge_prepare_secs: DEFAULT_CHALLENGE_PREPARE_SECS,
            challenge_perform_secs: DEFAULT_CHALLENGE_PERFORM_SECS,
            challenge_bonus: DEFAULT_CHALLENGE_BONUS,
            shield_decay_chance: DEFAULT_SHIELD_DECAY_CHANCE,
            playback_hint_secs: DEFAULT_PLAYBACK_HINT.as_secs(),
        }
    }
}

impl GameSettings {
    /// Validate settings
    pub fn validate(&self) -> Result<(), ValidationError> {
        let invalid = |msg: &str| Err(ValidationError::InvalidSettings(msg.to_string()));

        if self.min_players < 2 {
            return invalid("min players must be at least 2");
        }
        if self.max_players < self.min_players {
            return invalid("max players must not be below min players");
        }
        if self.min_name_len == 0 || self.max_name_len < self.min_name_len {
            return invalid("name length bounds are inconsistent");
        }
        if self.inventory_cap == 0 {
            return invalid("inventory cap must be positive");
        }
        if self.starting_tokens.iter().any(|t| *t == 0) {
            return invalid("wager tokens must be positive");
        }
        let mut tokens = self.starting_tokens.clone();
        tokens.sort_unstable();
        tokens.dedup();
        if tokens.len() != self.starting_tokens.len() {
            return invalid("wager tokens must be distinct");
        }
        if self.target_score == 0 {
            return invalid("target score must be positive");
        }
        if self.game_clock_secs == 0 {
            return invalid("game clock must be positive");
        }
        if self.betting_secs == 0 || self.precision_secs == 0 {
            return invalid("countdowns must be positive");
        }
        if self.challenge_prepare_secs == 0 || self.challenge_perform_secs == 0 {
            return invalid("challenge countdowns must be positive");
        }
        if self.precision_questions == 0 {
            return invalid("precision quiz needs at least one question");
        }
        if !(0.0..=1.0).contains(&self.shield_decay_chance) {
            return invalid("shield decay chance must be within 0..=1");
        }

        Ok(())
    }

    #[must_use]
    pub fn betting_duration(&self) -> Duration {
        Duration::from_secs(self.betting_secs)
    }

    #[must_use]
    pub fn playback_hint(&self) -> Duration {
        Duration::from_secs(self.playback_hint_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_are_valid() {
        let settings = GameSettings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.starting_tokens, vec![1, 2, 3]);
        assert_eq!(settings.inventory_cap, 5);
        assert_eq!(settings.max_players, 8);
    }

    #[test]
    fn test_rejects_duplicate_tokens() {
        let settings = GameSettings {
            starting_tokens: vec![1, 1, 2],
            ..Default::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(ValidationError::InvalidSettings(_))
        ));
    }

    #[test]
    fn test_rejects_bad_decay_chance() {
        let settings = GameSettings {
            shield_decay_chance: 1.5,
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let settings: GameSettings = serde_json::from_str(r#"{"target_score": 10}"#).unwrap();
        assert_eq!(settings.target_score, 10);
        assert_eq!(settings.betting_secs, DEFAULT_BETTING_SECS);
    }
}

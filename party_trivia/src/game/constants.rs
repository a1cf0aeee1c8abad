//! Default limits and tuning values for a trivia session.

use std::time::Duration;

/// Maximum number of players seated in one session.
pub const DEFAULT_MAX_PLAYERS: usize = 8;

/// A round can't be requested with fewer players than this.
pub const MIN_PLAYERS: usize = 2;

/// Display names are trimmed before these bounds are checked.
pub const MIN_NAME_LENGTH: usize = 2;
pub const MAX_NAME_LENGTH: usize = 24;

/// Power cards a single player may hold at once.
pub const DEFAULT_INVENTORY_CAP: usize = 5;

/// Wager tokens handed to every player when they join.
pub const DEFAULT_STARTING_TOKENS: [u32; 3] = [1, 2, 3];

pub const DEFAULT_TARGET_SCORE: u32 = 30;
pub const DEFAULT_GAME_CLOCK_SECS: u64 = 30 * 60;
pub const DEFAULT_BETTING_SECS: u64 = 15;
pub const DEFAULT_PRECISION_SECS: u64 = 15;
pub const PRECISION_QUESTION_COUNT: usize = 3;
pub const DEFAULT_CHALLENGE_PREPARE_SECS: u64 = 10;
pub const DEFAULT_CHALLENGE_PERFORM_SECS: u64 = 30;
pub const DEFAULT_CHALLENGE_BONUS: u32 = 3;

/// Chance that an active shield fades each time the turn rotates.
pub const DEFAULT_SHIELD_DECAY_CHANCE: f64 = 0.25;

/// Used when the catalog doesn't say how long a preview runs.
pub const DEFAULT_PLAYBACK_HINT: Duration = Duration::from_secs(30);

/// Round number from which wagers are offered.
pub const FIRST_BETTING_ROUND: u32 = 2;

// Combo thresholds.
pub const HOT_STREAK_THRESHOLD: u32 = 3;
pub const TYPE_SPECIALIST_THRESHOLD: u32 = 3;
pub const HARD_HITTER_THRESHOLD: u32 = 2;
pub const TYPE_SPECIALIST_BONUS: u32 = 2;

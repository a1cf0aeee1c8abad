//! Per-session configuration.

use serde::{Deserialize, Serialize};

use crate::catalog::QuestionFilters;
use crate::game::{GameSettings, SessionResult, ValidationError};

/// Longest session name accepted
pub const MAX_SESSION_NAME_LEN: usize = 64;

/// Everything needed to create a session
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct SessionConfig {
    /// Display name shown to the room
    pub name: String,

    /// Game rules
    #[serde(default)]
    pub settings: GameSettings,

    /// Restricts which questions the catalog serves
    #[serde(default)]
    pub filters: QuestionFilters,

    /// Fixes every pseudo-random choice when set
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            name: "Party Trivia".to_string(),
            settings: GameSettings::default(),
            filters: QuestionFilters::default(),
            seed: None,
        }
    }
}

impl SessionConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> SessionResult<()> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ValidationError::InvalidSettings(
                "session name must not be empty".to_string(),
            )
            .into());
        }

        if name.chars().count() > MAX_SESSION_NAME_LEN {
            return Err(ValidationError::InvalidSettings(format!(
                "session name must be at most {MAX_SESSION_NAME_LEN} characters"
            ))
            .into());
        }

        self.settings.validate()?;
        Ok(())
    }
}

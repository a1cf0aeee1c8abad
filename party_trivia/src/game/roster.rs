//! Player roster and turn order.

use log::info;
use rand::Rng;

use super::{
    entities::{Player, PlayerId, RoundPhase, WagerTokens},
    errors::{NotFound, SessionResult, ValidationError},
    events::GameEvent,
    session::Session,
};

/// Seated players in join order plus the index of the player whose turn
/// it is.
#[derive(Clone, Debug)]
pub struct Roster {
    players: Vec<Player>,
    turn: usize,
    next_id: PlayerId,
}

impl Roster {
    #[must_use]
    pub fn new() -> Self {
        Self {
            players: Vec::new(),
            turn: 0,
            next_id: 1,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.players.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Player> {
        self.players.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Player> {
        self.players.iter_mut()
    }

    #[must_use]
    pub fn get(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn get_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == id)
    }

    #[must_use]
    pub fn contains(&self, id: PlayerId) -> bool {
        self.get(id).is_some()
    }

    /// The player whose turn it is, if anyone is seated.
    #[must_use]
    pub fn current(&self) -> Option<&Player> {
        self.players.get(self.turn)
    }

    /// Seats a new player. Names are trimmed, then checked for length and
    /// for case-insensitive uniqueness.
    pub fn add(
        &mut self,
        name: &str,
        tokens: WagerTokens,
        inventory_cap: usize,
        limits: NameLimits,
    ) -> Result<PlayerId, ValidationError> {
        let name = name.trim();
        let len = name.chars().count();
        if len < limits.min_len {
            return Err(ValidationError::NameTooShort { min: limits.min_len });
        }
        if len > limits.max_len {
            return Err(ValidationError::NameTooLong { max: limits.max_len });
        }
        if self.players.len() >= limits.max_players {
            return Err(ValidationError::RosterFull {
                max: limits.max_players,
            });
        }
        let lowered = name.to_lowercase();
        if self.players.iter().any(|p| p.name.to_lowercase() == lowered) {
            return Err(ValidationError::DuplicateName(name.to_string()));
        }

        let id = self.next_id;
        self.next_id += 1;
        self.players
            .push(Player::new(id, name.to_string(), tokens, inventory_cap));
        Ok(id)
    }

    /// Removes a player while keeping the remaining turn order. Removing
    /// a player at or before the turn index moves the index back one, so a
    /// departing current player hands the turn to their predecessor and the
    /// next rotation reaches their successor.
    pub fn remove(&mut self, id: PlayerId) -> Option<Player> {
        let idx = self.players.iter().position(|p| p.id == id)?;
        let player = self.players.remove(idx);
        if self.players.is_empty() {
            self.turn = 0;
        } else if idx <= self.turn {
            self.turn = self.turn.checked_sub(1).unwrap_or(self.players.len() - 1);
        }
        Some(player)
    }

    /// Passes the turn to the next player in join order, wrapping around.
    pub fn advance(&mut self) -> Option<PlayerId> {
        if self.players.is_empty() {
            return None;
        }
        self.turn = (self.turn + 1) % self.players.len();
        self.current().map(|p| p.id)
    }
}

impl Default for Roster {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Copy, Debug)]
pub struct NameLimits {
    pub min_len: usize,
    pub max_len: usize,
    pub max_players: usize,
}

impl Session {
    pub fn add_player(&mut self, name: &str) -> SessionResult<PlayerId> {
        self.ensure_roster_editable()?;
        let limits = NameLimits {
            min_len: self.settings.min_name_len,
            max_len: self.settings.max_name_len,
            max_players: self.settings.max_players,
        };
        let tokens = WagerTokens::new(self.settings.starting_tokens.iter().copied());
        let id = self
            .roster
            .add(name, tokens, self.settings.inventory_cap, limits)?;

        let name = name.trim().to_string();
        info!("{}: {name} joined as player {id}", self.name);
        self.push_event(GameEvent::PlayerJoined {
            player_id: id,
            name,
        });
        Ok(id)
    }

    /// Removes a player. A wager they placed this round is dropped with
    /// them; if everyone left has now wagered, betting closes.
    pub fn remove_player(&mut self, player_id: PlayerId) -> SessionResult<()> {
        self.ensure_roster_editable()?;
        let player = self
            .roster
            .remove(player_id)
            .ok_or(NotFound::Player(player_id))?;
        if let Some(round) = self.round.as_mut() {
            round.bets.retain(|b| b.player_id != player_id);
            if round.winner == Some(player_id) {
                round.winner = None;
            }
        }

        info!("{}: {} left", self.name, player.name);
        self.push_event(GameEvent::PlayerLeft {
            player_id,
            name: player.name,
        });

        if self.phase() == RoundPhase::Betting && self.all_bets_in() {
            self.finish_betting();
        }
        Ok(())
    }

    /// Advances the turn. Shields may wear off on every rotation.
    pub(crate) fn rotate_turn(&mut self) {
        let chance = self.settings.shield_decay_chance;
        let mut decayed = Vec::new();
        for player in self.roster.iter_mut() {
            if player.flags.shielded && self.rng.random_bool(chance) {
                player.flags.shielded = false;
                decayed.push(player.id);
            }
        }
        for player_id in decayed {
            self.push_event(GameEvent::ShieldDecayed { player_id });
        }
        if let Some(player_id) = self.roster.advance() {
            self.push_event(GameEvent::TurnPassed { player_id });
        }
    }
}

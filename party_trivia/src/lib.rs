//! # Party Trivia
//!
//! Round and power-card session engine for a party music-trivia game.
//!
//! A moderator device drives each game. It adds players, asks for rounds,
//! reports wagers and reveals answers. Players spend wager tokens on their
//! confidence, collect power cards and play them against each other. The
//! engine keeps every session's state consistent while commands and
//! countdowns arrive in any order.
//!
//! ## Round phases
//!
//! - **Idle**: waiting for the moderator to request a round
//! - **Loading**: the catalog is choosing a question
//! - **Audio**: the track preview is playing
//! - **Betting**: players wager a token (from round 2 on)
//! - **Question**: the question is shown
//! - **Answer**: the answer is revealed and points are awarded
//!
//! ## Core Modules
//!
//! - [`game`]: the synchronous state machine, scoring, power cards and errors
//! - [`session`]: one tokio actor per game plus the session registry
//! - [`catalog`]: where questions come from
//! - [`audio`]: playback collaborator and its completion token
//! - [`history`]: optional persistence of final standings
//!
//! ## Example
//!
//! ```
//! use party_trivia::{GameSettings, Session, SessionCommand};
//!
//! let id = uuid::Uuid::new_v4();
//! let mut session = Session::new(id, "Friday", GameSettings::default(), Some(7)).unwrap();
//! session.apply(SessionCommand::AddPlayer { name: "Ada".into() }).unwrap();
//! session.apply(SessionCommand::AddPlayer { name: "Grace".into() }).unwrap();
//! session.apply(SessionCommand::StartGame).unwrap();
//! assert_eq!(session.current_turn(), Some(1));
//! ```

/// Audio playback collaborator.
pub mod audio;

/// Question catalog collaborator.
pub mod catalog;

/// Core game logic, entities, and state machine.
pub mod game;
pub use game::{
    CommandOutcome, ErrorKind, GameEvent, GameSettings, Session, SessionCommand, SessionError,
    SessionResult, SessionSnapshot, constants, entities,
};

/// Final standings persistence.
pub mod history;

/// Session actors and registry.
pub mod session;
pub use session::{Collaborators, SessionConfig, SessionHandle, SessionManager};

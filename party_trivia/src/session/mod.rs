//! Session actors and the session registry.
//!
//! Every game runs in its own [`SessionActor`], which owns the [`Session`]
//! state machine exclusively and processes messages one at a time. The
//! actor carries out the session's directives: catalog fetches, audio
//! playback, countdowns and standings recording. It pushes a
//! [`SessionUpdate`] to subscribers after every mutation.
//!
//! [`Session`]: crate::game::Session

pub mod actor;
pub mod config;
pub mod manager;
pub mod messages;

pub use actor::{Collaborators, SessionActor, SessionHandle};
pub use config::SessionConfig;
pub use manager::SessionManager;
pub use messages::{SessionMessage, SessionMetadata, SessionUpdate};

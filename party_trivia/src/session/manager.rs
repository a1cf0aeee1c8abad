//! Session manager for spawning and managing multiple session actors.

use super::{
    actor::{Collaborators, SessionActor, SessionHandle},
    config::SessionConfig,
    messages::SessionMetadata,
};
use crate::game::{CommandOutcome, NotFound, SessionCommand, SessionId, SessionResult};
use std::{collections::HashMap, sync::Arc};
use tokio::sync::RwLock;
use uuid::Uuid;

/// Session manager for managing multiple game sessions
///
/// Each session runs in its own actor, so commands for different sessions
/// never wait on each other. The registry lock is only held to look up or
/// insert a handle.
#[derive(Clone)]
pub struct SessionManager {
    /// Catalog, audio and history services shared by every session
    collaborators: Collaborators,

    /// Active session handles
    sessions: Arc<RwLock<HashMap<SessionId, SessionHandle>>>,
}

impl SessionManager {
    pub fn new(collaborators: Collaborators) -> Self {
        Self {
            collaborators,
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Create and spawn a new session
    ///
    /// # Arguments
    ///
    /// * `config` - Session configuration
    ///
    /// # Returns
    ///
    /// * `SessionResult<SessionId>` - Session ID or a validation error
    pub async fn create_session(&self, config: SessionConfig) -> SessionResult<SessionId> {
        let session_id = Uuid::new_v4();
        let (actor, handle) = SessionActor::new(session_id, config, self.collaborators.clone())?;

        let mut sessions = self.sessions.write().await;
        sessions.insert(session_id, handle);
        drop(sessions);

        tokio::spawn(async move {
            actor.run().await;
        });

        log::info!("Created and spawned session {}", session_id);
        Ok(session_id)
    }

    /// Get a session handle
    pub async fn get_session(&self, session_id: SessionId) -> Option<SessionHandle> {
        let sessions = self.sessions.read().await;
        sessions.get(&session_id).cloned()
    }

    async fn handle(&self, session_id: SessionId) -> SessionResult<SessionHandle> {
        self.get_session(session_id)
            .await
            .ok_or_else(|| NotFound::Session(session_id).into())
    }

    /// Apply a command to a session
    pub async fn execute(
        &self,
        session_id: SessionId,
        command: SessionCommand,
    ) -> SessionResult<CommandOutcome> {
        self.handle(session_id).await?.execute(command).await
    }

    /// List all active sessions, newest first
    pub async fn list_sessions(&self) -> Vec<SessionMetadata> {
        let handles: Vec<SessionHandle> = {
            let sessions = self.sessions.read().await;
            sessions.values().cloned().collect()
        };

        let mut metadata_list = Vec::with_capacity(handles.len());
        for handle in handles {
            match handle.metadata().await {
                Ok(metadata) => metadata_list.push(metadata),
                Err(e) => log::debug!("Skipping session {}: {}", handle.session_id(), e),
            }
        }
        metadata_list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        metadata_list
    }

    /// Close a session
    ///
    /// The actor stops and its handle leaves the registry. Closing a
    /// session that is still running does not finish the game, so no
    /// standings are recorded.
    pub async fn close_session(&self, session_id: SessionId) -> SessionResult<()> {
        let handle = {
            let mut sessions = self.sessions.write().await;
            sessions.remove(&session_id)
        }
        .ok_or(NotFound::Session(session_id))?;

        if let Err(e) = handle.close().await {
            log::debug!("Session {} was already stopped: {}", session_id, e);
        }

        log::info!("Closed session {}", session_id);
        Ok(())
    }

    /// Number of sessions in the registry
    pub async fn active_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Close every session (server shutdown)
    pub async fn close_all(&self) {
        let handles: Vec<SessionHandle> = {
            let mut sessions = self.sessions.write().await;
            sessions.drain().map(|(_, handle)| handle).collect()
        };
        for handle in handles {
            let _ = handle.close().await;
        }
    }
}

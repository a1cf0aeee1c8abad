//! WebSocket handler for live session updates.
//!
//! Presentation screens and the moderator device connect here. The server
//! pushes the current snapshot on connect and an update after every
//! mutation; any text frame received is parsed as a [`SessionCommand`] and
//! answered with its outcome or error.
//!
//! # Example
//!
//! ```javascript
//! const ws = new WebSocket('ws://localhost:7878/ws/5b3c...');
//!
//! ws.onmessage = (event) => {
//!   const msg = JSON.parse(event.data);
//!   if (msg.type === 'update') render(msg.snapshot, msg.events);
//! };
//!
//! ws.send(JSON.stringify({ type: 'reveal_answer', winner: 2 }));
//! ```

use axum::{
    extract::{
        Path, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::{IntoResponse, Response},
};
use futures_util::{Sink, SinkExt, StreamExt};
use log::{error, info, warn};
use party_trivia::{
    CommandOutcome, GameEvent, SessionCommand, SessionError, SessionHandle, SessionSnapshot,
    game::{NotFound, SessionId},
};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use super::{
    ApiError, AppState,
    rate_limiter::{CommandLimiter, Limit},
    sessions,
};
use crate::metrics;

/// Messages pushed to the client
#[derive(Debug, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Sent once on connect
    Snapshot { snapshot: SessionSnapshot },
    /// Sent after every mutation
    Update {
        snapshot: SessionSnapshot,
        events: Vec<GameEvent>,
    },
    /// A command from this connection was applied
    Outcome { outcome: CommandOutcome },
    /// A command from this connection was rejected
    Error { error: String, kind: String },
    /// The session was closed
    Closed,
}

impl ServerMessage {
    fn rejected(kind: impl ToString, error: impl Into<String>) -> Self {
        Self::Error {
            error: error.into(),
            kind: kind.to_string(),
        }
    }
}

/// Upgrade to a WebSocket bound to one session.
///
/// # Errors
///
/// - `404 Not Found`: Unknown session (before the upgrade)
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    Path(session_id): Path<SessionId>,
    State(state): State<AppState>,
) -> Response {
    match state.manager.get_session(session_id).await {
        Some(handle) => ws.on_upgrade(move |socket| handle_socket(socket, handle, state)),
        None => ApiError::from(SessionError::from(NotFound::Session(session_id))).into_response(),
    }
}

async fn handle_socket(socket: WebSocket, handle: SessionHandle, state: AppState) {
    let session_id = handle.session_id();
    let (mut sender, mut receiver) = socket.split();

    let (subscriber_id, snapshot, mut updates) =
        match handle.subscribe(state.defaults.subscriber_buffer).await {
            Ok(subscription) => subscription,
            Err(e) => {
                warn!("WebSocket for session {} could not subscribe: {}", session_id, e);
                return;
            }
        };

    metrics::websocket_connected();
    info!("WebSocket connected: session={}, subscriber={}", session_id, subscriber_id);

    let (response_tx, mut response_rx) = mpsc::channel::<ServerMessage>(32);

    let send_task = tokio::spawn(async move {
        if send_json(&mut sender, &ServerMessage::Snapshot { snapshot })
            .await
            .is_err()
        {
            return;
        }

        loop {
            let message = tokio::select! {
                update = updates.recv() => match update {
                    Some(update) => ServerMessage::Update {
                        snapshot: update.snapshot,
                        events: update.events,
                    },
                    None => {
                        let _ = send_json(&mut sender, &ServerMessage::Closed).await;
                        let _ = sender.send(Message::Close(None)).await;
                        break;
                    }
                },
                Some(response) = response_rx.recv() => response,
            };

            if send_json(&mut sender, &message).await.is_err() {
                break;
            }
        }
    });

    let mut limiter = CommandLimiter::default();

    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                metrics::websocket_messages_received();

                let response = match limiter.check() {
                    Err(Limit::Burst) => ServerMessage::rejected(
                        "rate_limited",
                        "Rate limit exceeded. Please slow down.",
                    ),
                    Err(Limit::Sustained) => ServerMessage::rejected(
                        "rate_limited",
                        "Too many commands. Please wait before sending more.",
                    ),
                    Ok(()) => handle_client_message(&text, session_id, &state).await,
                };

                if response_tx.send(response).await.is_err() {
                    break;
                }
            }
            Ok(Message::Close(_)) => break,
            Err(e) => {
                error!("WebSocket error on session {}: {}", session_id, e);
                break;
            }
            _ => {}
        }
    }

    send_task.abort();
    let _ = handle.unsubscribe(subscriber_id).await;
    metrics::websocket_disconnected();
    info!("WebSocket disconnected: session={}, subscriber={}", session_id, subscriber_id);
}

/// Parse one text frame as a command and apply it.
async fn handle_client_message(text: &str, session_id: SessionId, state: &AppState) -> ServerMessage {
    let command = match serde_json::from_str::<SessionCommand>(text) {
        Ok(command) => command,
        Err(e) => {
            warn!("Failed to parse client message: {}", e);
            return ServerMessage::rejected("invalid_message", format!("Invalid command: {e}"));
        }
    };

    match sessions::dispatch(state, session_id, command).await {
        Ok(outcome) => ServerMessage::Outcome { outcome },
        Err(e) => ServerMessage::rejected(e.kind(), e.to_string()),
    }
}

async fn send_json<S>(sender: &mut S, message: &ServerMessage) -> Result<(), ()>
where
    S: Sink<Message> + Unpin,
{
    let json = match serde_json::to_string(message) {
        Ok(json) => json,
        Err(e) => {
            error!("Failed to serialize server message: {}", e);
            return Ok(());
        }
    };
    sender.send(Message::Text(json.into())).await.map_err(|_| ())
}

//! Session management and command API handlers.
//!
//! # Examples
//!
//! Create a session:
//! ```bash
//! curl -X POST http://localhost:7878/api/v1/sessions \
//!   -H "Content-Type: application/json" \
//!   -d '{"name": "Friday Quiz", "settings": {"target_score": 20}}'
//! ```
//!
//! Place a bet:
//! ```bash
//! curl -X POST http://localhost:7878/api/v1/sessions/$ID/commands \
//!   -H "Content-Type: application/json" \
//!   -d '{"type": "place_bet", "player_id": 1, "token": 2}'
//! ```

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use party_trivia::{
    CommandOutcome, GameSettings, SessionCommand, SessionConfig, SessionError, SessionHandle,
    SessionSnapshot,
    catalog::QuestionFilters,
    game::{FinalStandings, NotFound, SessionId},
    session::SessionMetadata,
};
use serde::{Deserialize, Serialize};

use super::{ApiError, AppState, request_id::RequestId};
use crate::{logging, metrics};

/// Default and maximum number of entries returned by `/history`
const HISTORY_DEFAULT_LIMIT: usize = 10;
const HISTORY_MAX_LIMIT: usize = 100;

#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    pub name: String,
    /// Server defaults apply when omitted
    #[serde(default)]
    pub settings: Option<GameSettings>,
    #[serde(default)]
    pub filters: QuestionFilters,
    #[serde(default)]
    pub seed: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct SessionCreated {
    pub id: SessionId,
    pub snapshot: SessionSnapshot,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<usize>,
}

async fn session_handle(state: &AppState, session_id: SessionId) -> Result<SessionHandle, ApiError> {
    state
        .manager
        .get_session(session_id)
        .await
        .ok_or_else(|| SessionError::from(NotFound::Session(session_id)).into())
}

/// Apply one command to a session and record its metrics.
///
/// Shared by the REST endpoint and the WebSocket.
pub async fn dispatch(
    state: &AppState,
    session_id: SessionId,
    command: SessionCommand,
) -> Result<CommandOutcome, SessionError> {
    let label = command.label();
    let result = state.manager.execute(session_id, command).await;

    match &result {
        Ok(outcome) => {
            metrics::commands_total(label, "ok");
            match outcome {
                CommandOutcome::RoundRequested { .. } => metrics::rounds_started_total(),
                CommandOutcome::CardPlayed { .. } => metrics::power_cards_played_total(),
                _ => {}
            }
        }
        Err(e) => {
            let kind = e.kind().to_string();
            metrics::commands_total(label, &kind);
            logging::log_command_rejected(&session_id.to_string(), label, &kind, &e.to_string());
        }
    }

    result
}

/// List all open sessions, newest first.
pub async fn list_sessions(State(state): State<AppState>) -> Json<Vec<SessionMetadata>> {
    Json(state.manager.list_sessions().await)
}

/// Create a session.
///
/// # Response
///
/// Returns `201 Created` with the new id and its initial snapshot.
///
/// # Errors
///
/// - `422 Unprocessable Entity`: Invalid name or settings
/// - `503 Service Unavailable`: Session limit reached
pub async fn create_session(
    State(state): State<AppState>,
    request_id: RequestId,
    Json(request): Json<CreateSessionRequest>,
) -> Result<(StatusCode, Json<SessionCreated>), ApiError> {
    let max = state.defaults.max_sessions;
    if state.manager.active_count().await >= max {
        return Err(ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            "capacity",
            format!("session limit of {max} reached"),
        ));
    }

    let config = SessionConfig {
        name: request.name,
        settings: request
            .settings
            .unwrap_or_else(|| state.defaults.settings.clone()),
        filters: request.filters,
        seed: request.seed,
    };

    let id = state.manager.create_session(config).await?;
    metrics::sessions_created_total();
    metrics::sessions_active(state.manager.active_count().await);
    tracing::info!(request_id = request_id.as_str(), session_id = %id, "Session created");

    let snapshot = session_handle(&state, id).await?.snapshot().await?;
    Ok((StatusCode::CREATED, Json(SessionCreated { id, snapshot })))
}

/// Current snapshot of a session.
pub async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<SessionId>,
) -> Result<Json<SessionSnapshot>, ApiError> {
    let snapshot = session_handle(&state, session_id).await?.snapshot().await?;
    Ok(Json(snapshot))
}

/// Close a session and stop its actor. Standings are not recorded.
pub async fn close_session(
    State(state): State<AppState>,
    Path(session_id): Path<SessionId>,
) -> Result<StatusCode, ApiError> {
    state.manager.close_session(session_id).await?;
    metrics::sessions_active(state.manager.active_count().await);
    tracing::info!(session_id = %session_id, "Session closed");
    Ok(StatusCode::NO_CONTENT)
}

/// Apply one moderator command.
///
/// # Errors
///
/// - `404 Not Found`: Unknown session, player, card or target
/// - `409 Conflict`: Command not allowed in the current phase
/// - `422 Unprocessable Entity`: Malformed for the current data
pub async fn execute_command(
    State(state): State<AppState>,
    Path(session_id): Path<SessionId>,
    request_id: RequestId,
    Json(command): Json<SessionCommand>,
) -> Result<Json<CommandOutcome>, ApiError> {
    tracing::debug!(request_id = request_id.as_str(), session_id = %session_id, command = %command, "Command received");
    let outcome = dispatch(&state, session_id, command).await?;
    Ok(Json(outcome))
}

/// Standings as they would be recorded if the game ended now.
pub async fn get_standings(
    State(state): State<AppState>,
    Path(session_id): Path<SessionId>,
) -> Result<Json<FinalStandings>, ApiError> {
    let standings = session_handle(&state, session_id).await?.standings().await?;
    Ok(Json(standings))
}

/// Recently finished games, newest first.
///
/// Empty when no recorder is configured.
pub async fn history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<FinalStandings>>, ApiError> {
    let Some(recorder) = &state.recorder else {
        return Ok(Json(Vec::new()));
    };

    let limit = query
        .limit
        .unwrap_or(HISTORY_DEFAULT_LIMIT)
        .clamp(1, HISTORY_MAX_LIMIT);

    recorder.recent(limit).await.map(Json).map_err(|e| {
        tracing::error!("Failed to read standings history: {}", e);
        ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "history",
            "standings history is unavailable",
        )
    })
}

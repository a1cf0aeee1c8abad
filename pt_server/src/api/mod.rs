//! HTTP/WebSocket API for the party trivia server.
//!
//! The moderator device drives sessions through the REST command endpoint or
//! over a WebSocket; presentation screens subscribe over the WebSocket and
//! receive a snapshot after every mutation.
//!
//! # Modules
//!
//! - [`sessions`]: Session registry and command surface
//! - [`websocket`]: Live snapshot push and command intake
//! - [`rate_limiter`]: Sliding-window limits for WebSocket commands
//! - [`request_id`]: Request correlation, access log and HTTP metrics
//!
//! # Endpoints Overview
//!
//! ```text
//! GET    /health                              - Server health status
//! GET    /metrics                             - Prometheus text (when enabled)
//! GET    /api/v1/sessions                     - List open sessions
//! POST   /api/v1/sessions                     - Create a session
//! GET    /api/v1/sessions/{id}                - Current snapshot
//! DELETE /api/v1/sessions/{id}                - Close a session
//! POST   /api/v1/sessions/{id}/commands       - Apply one command
//! GET    /api/v1/sessions/{id}/standings      - Standings as of now
//! GET    /api/v1/history?limit=N              - Recently finished games
//! GET    /ws/{id}                             - WebSocket
//! ```
//!
//! # Errors
//!
//! Rejected commands come back as `{"error": "...", "kind": "..."}` with
//! `422` for validation errors, `409` for state conflicts and `404` for
//! unknown ids.

pub mod rate_limiter;
pub mod request_id;
pub mod sessions;
pub mod websocket;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
};
use metrics_exporter_prometheus::PrometheusHandle;
use party_trivia::{ErrorKind, SessionError, SessionManager, history::StandingsRecorder};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::config::SessionDefaults;

/// Application state shared across all HTTP handlers and WebSocket connections.
///
/// Cloned for each request; every field is a cheap handle.
#[derive(Clone)]
pub struct AppState {
    pub manager: SessionManager,
    /// Same recorder the sessions write to, read back by `/history`
    pub recorder: Option<Arc<dyn StandingsRecorder>>,
    pub defaults: Arc<SessionDefaults>,
    pub metrics: Option<PrometheusHandle>,
}

/// JSON body of every error response
#[derive(Debug, Deserialize, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub kind: String,
}

/// An error on its way to becoming an HTTP response
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub kind: String,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, kind: &str, message: impl Into<String>) -> Self {
        Self {
            status,
            kind: kind.to_string(),
            message: message.into(),
        }
    }
}

/// Status code for each error category
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Validation => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::StateConflict => StatusCode::CONFLICT,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        let kind = err.kind();
        Self::new(status_for(kind), &kind.to_string(), err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: self.message,
            kind: self.kind,
        };
        (self.status, Json(body)).into_response()
    }
}

/// Create the complete API router with all endpoints and middleware.
pub fn create_router(state: AppState) -> Router {
    let root_routes = Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_endpoint))
        .route("/ws/{session_id}", get(websocket::websocket_handler));

    Router::new()
        .merge(root_routes)
        .nest("/api/v1", create_v1_router())
        .layer(axum::middleware::from_fn(request_id::request_id_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn create_v1_router() -> Router<AppState> {
    Router::new()
        .route(
            "/sessions",
            get(sessions::list_sessions).post(sessions::create_session),
        )
        .route(
            "/sessions/{session_id}",
            get(sessions::get_session).delete(sessions::close_session),
        )
        .route(
            "/sessions/{session_id}/commands",
            axum::routing::post(sessions::execute_command),
        )
        .route(
            "/sessions/{session_id}/standings",
            get(sessions::get_standings),
        )
        .route("/history", get(sessions::history))
}

/// Health check endpoint for monitoring and load balancers.
///
/// ```bash
/// curl http://localhost:7878/health
/// # {"status":"healthy","sessions":{"active_count":2,"max":32},...}
/// ```
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let active_count = state.manager.active_count().await;

    let response = json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "sessions": {
            "active_count": active_count,
            "max": state.defaults.max_sessions,
        },
        "history": state.recorder.is_some(),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    (StatusCode::OK, Json(response))
}

async fn metrics_endpoint(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(handle) => handle.render().into_response(),
        None => ApiError::new(StatusCode::NOT_FOUND, "not_found", "metrics are disabled")
            .into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use party_trivia::game::{NotFound, StateConflict, ValidationError};
    use uuid::Uuid;

    #[test]
    fn test_status_per_error_kind() {
        let validation: SessionError = ValidationError::RosterFull { max: 8 }.into();
        let missing: SessionError = NotFound::Session(Uuid::new_v4()).into();

        assert_eq!(
            ApiError::from(validation).status,
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(ApiError::from(missing).status, StatusCode::NOT_FOUND);
        assert_eq!(status_for(ErrorKind::StateConflict), StatusCode::CONFLICT);
    }

    #[test]
    fn test_error_kind_label() {
        let err = ApiError::from(SessionError::from(NotFound::Player(9)));
        assert_eq!(err.kind, "not_found");

        let err = ApiError::from(SessionError::from(StateConflict::NoTargetedAction));
        assert_eq!(err.kind, "state_conflict");
        assert_eq!(err.message, "no targeted action is pending");
    }
}

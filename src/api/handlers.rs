//! HTTP request handlers

use super::sse::sse_stream;
use super::types::{ErrorResponse, MenuItemResponse, MenuResponse, MessageRequest};
use super::AppState;
use crate::runtime::{SessionError, SessionEvent, SessionSnapshot};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Menu
        .route("/api/menu", get(get_menu))
        // Session lifecycle
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/:id", get(get_session))
        // Customer input
        .route("/api/sessions/:id/messages", post(send_message))
        // SSE streaming
        .route("/api/sessions/:id/stream", get(stream_session))
        // Version
        .route("/version", get(get_version))
        .with_state(state)
}

// ============================================================
// Menu
// ============================================================

async fn get_menu(State(state): State<AppState>) -> Json<MenuResponse> {
    let items = state
        .sessions
        .catalog()
        .items()
        .iter()
        .map(MenuItemResponse::from)
        .collect();
    Json(MenuResponse { items })
}

// ============================================================
// Sessions
// ============================================================

async fn create_session(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<SessionSnapshot>), AppError> {
    let handle = state.sessions.create().await;
    let snapshot = handle.snapshot().await?;
    Ok((StatusCode::CREATED, Json(snapshot)))
}

async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionSnapshot>, AppError> {
    let handle = state.sessions.get(&id).await?;
    Ok(Json(handle.snapshot().await?))
}

async fn stream_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let handle = state.sessions.get(&id).await?;

    // Subscribe before the snapshot so nothing falls between the two
    let broadcast_rx = handle.subscribe();
    let snapshot = handle.snapshot().await?;

    Ok(sse_stream(SessionEvent::Init { snapshot }, broadcast_rx))
}

// ============================================================
// Customer Input
// ============================================================

async fn send_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<MessageRequest>,
) -> Result<Json<SessionSnapshot>, AppError> {
    let text = req.text.trim();
    if text.is_empty() {
        return Err(AppError::BadRequest("Message text is empty".to_string()));
    }

    let handle = state.sessions.get(&id).await?;
    let snapshot = handle.submit(text).await?;
    Ok(Json(snapshot))
}

// ============================================================
// Version
// ============================================================

async fn get_version() -> &'static str {
    concat!("orderly ", env!("CARGO_PKG_VERSION"))
}

// ============================================================
// Error Handling
// ============================================================

enum AppError {
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    Internal(String),
}

impl From<SessionError> for AppError {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::NotFound(_) => AppError::NotFound(e.to_string()),
            SessionError::Busy => AppError::Conflict(e.to_string()),
            SessionError::Closed => AppError::Internal(e.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}

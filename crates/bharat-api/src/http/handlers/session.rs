//! Session HTTP handlers.
//!
//! Endpoints:
//! - GET    /api/sessions/{id} - Role and history of a session
//! - DELETE /api/sessions/{id} - Forget a session

use axum::Json;
use axum::extract::{Path, State};
use serde_json::{Value, json};

use bharat_types::chat::SessionId;

use crate::http::error::AppError;
use crate::state::AppState;

/// GET /api/sessions/{id}
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let session = state
        .chat_service
        .session(&SessionId::new(id))
        .await?
        .ok_or_else(|| AppError::NotFound("Session not found".to_string()))?;

    Ok(Json(json!({
        "success": true,
        "session_id": session.id,
        "role": session.role,
        "history": session.history,
        "created_at": session.created_at,
        "last_active": session.last_active,
    })))
}

/// DELETE /api/sessions/{id}
pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let removed = state.chat_service.reset(&SessionId::new(id)).await?;
    Ok(Json(json!({ "success": true, "removed": removed })))
}

//! Chat HTTP handler.
//!
//! Endpoint:
//! - POST /api/chat - Send one message and receive the assistant reply

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use serde::{Deserialize, Serialize};

use bharat_core::chat::service::ChatRequest;
use bharat_types::chat::{RoleTag, SessionId};

use crate::http::error::AppError;
use crate::state::AppState;

/// Request body for POST /api/chat.
#[derive(Debug, Deserialize)]
pub struct ChatBody {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
}

/// Success body for POST /api/chat.
#[derive(Debug, Serialize)]
pub struct ChatResponseBody {
    pub success: bool,
    pub response: String,
    pub session_id: SessionId,
}

/// POST /api/chat - Run one chat exchange.
pub async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatBody>, JsonRejection>,
) -> Result<Json<ChatResponseBody>, AppError> {
    let Json(body) = payload?;

    let role = match body.role.as_deref().map(str::trim) {
        Some(role) if !role.is_empty() => {
            Some(role.parse::<RoleTag>().map_err(AppError::Validation)?)
        }
        _ => None,
    };

    let reply = state
        .chat_service
        .handle(ChatRequest {
            session_id: SessionId::resolve(body.session_id.as_deref()),
            role,
            message: body.message,
            model: body.model,
        })
        .await?;

    Ok(Json(ChatResponseBody {
        success: true,
        response: reply.response,
        session_id: reply.session_id,
    }))
}

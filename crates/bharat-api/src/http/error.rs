//! Application error type mapping to HTTP status codes and the
//! `{success: false, error, error_kind}` body.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use bharat_types::error::ChatError;

/// Message returned for failures whose detail must not reach clients.
pub const INTERNAL_ERROR_MESSAGE: &str = "internal error";

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// Errors from the chat service.
    Chat(ChatError),
    /// Unknown resource.
    NotFound(String),
    /// Malformed request rejected before reaching the service.
    Validation(String),
}

impl From<ChatError> for AppError {
    fn from(e: ChatError) -> Self {
        AppError::Chat(e)
    }
}

impl From<JsonRejection> for AppError {
    fn from(e: JsonRejection) -> Self {
        AppError::Validation(format!("Invalid JSON body: {}", e.body_text()))
    }
}

impl AppError {
    fn parts(&self) -> (StatusCode, String, String) {
        match self {
            AppError::Chat(ChatError::Validation(msg)) | AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                "validation_error".to_string(),
                msg.clone(),
            ),
            AppError::NotFound(msg) => {
                (StatusCode::NOT_FOUND, "not_found".to_string(), msg.clone())
            }
            AppError::Chat(e @ ChatError::Configuration(msg)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, e.kind(), msg.clone())
            }
            AppError::Chat(e @ ChatError::Upstream(llm)) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                e.kind(),
                llm.user_message(),
            ),
            AppError::Chat(e @ ChatError::Store(_)) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                e.kind(),
                INTERNAL_ERROR_MESSAGE.to_string(),
            ),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, kind, message) = self.parts();

        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), kind = %kind, error = ?self, "Request failed");
        } else {
            tracing::debug!(status = status.as_u16(), kind = %kind, %message, "Request rejected");
        }

        let body = json!({
            "success": false,
            "error": message,
            "error_kind": kind,
        });

        (
            status,
            [(axum::http::header::CONTENT_TYPE, "application/json")],
            body.to_string(),
        )
            .into_response()
    }
}

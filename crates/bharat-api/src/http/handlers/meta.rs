//! Catalog and credential HTTP handlers.
//!
//! Endpoints:
//! - GET /api/models       - Selectable model ids and labels
//! - GET /api/roles        - Traveller roles and descriptions
//! - GET /api/validate-key - Check the configured API key upstream

use axum::Json;
use axum::extract::State;
use serde_json::{Map, Value, json};

use bharat_types::chat::RoleTag;
use bharat_types::llm::MODEL_CATALOG;

use crate::http::error::AppError;
use crate::state::AppState;

/// GET /api/models
pub async fn list_models() -> Json<Value> {
    let models: Map<String, Value> = MODEL_CATALOG
        .iter()
        .map(|(id, label)| (id.to_string(), Value::from(*label)))
        .collect();
    Json(json!({ "success": true, "models": models }))
}

/// GET /api/roles
pub async fn list_roles() -> Json<Value> {
    let roles: Map<String, Value> = RoleTag::ALL
        .iter()
        .map(|role| (role.display_name().to_string(), Value::from(role.description())))
        .collect();
    Json(json!({ "success": true, "roles": roles }))
}

/// GET /api/validate-key
pub async fn validate_key(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let models = state.chat_service.validate_key().await?;
    Ok(Json(json!({
        "success": true,
        "message": "API key is valid",
        "models": models,
    })))
}

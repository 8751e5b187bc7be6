//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{Json, extract::State};

use crate::{
    infrastructure::dto::http::{SessionDto, SessionListDto},
    ui::state::AppState,
};

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Live sessions in arrival order
pub async fn list_sessions(State(state): State<Arc<AppState>>) -> Json<SessionListDto> {
    let listing = state.list_sessions_usecase.execute().await;

    // Domain Model から DTO への変換
    Json(SessionListDto {
        sessions: listing.sessions.iter().map(SessionDto::from).collect(),
        capacity: listing.capacity,
    })
}

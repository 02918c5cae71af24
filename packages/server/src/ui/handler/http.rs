//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{Json, extract::State};
use tokio::time::Instant;

use crate::{infrastructure::dto::http::UserSummaryDto, ui::state::AppState};

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Get the registered users, sorted by name
pub async fn list_users(State(state): State<Arc<AppState>>) -> Json<Vec<UserSummaryDto>> {
    let sessions = state.registry.snapshot_sessions().await;
    let now = Instant::now();

    // Domain Model から DTO への変換
    let users: Vec<UserSummaryDto> = sessions
        .into_iter()
        .map(|session| UserSummaryDto {
            idle_seconds: session.idle_for(now).as_secs(),
            name: session.name.into_string(),
            status: session.status,
            remote_address: session.remote_address,
        })
        .collect();

    Json(users)
}

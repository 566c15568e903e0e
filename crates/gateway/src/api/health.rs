use axum::extract::State;
use axum::response::{IntoResponse, Json};

use crate::state::AppState;

/// `GET /health`: liveness check (public, no auth).
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "cache": state.cache.tier_name(),
        "sessions": state.sessions.len(),
        "channel": state.channel.name(),
        "email": state.mailer.is_some(),
        "tutor": state.tutor.is_some(),
    }))
}

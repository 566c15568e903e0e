//! Broadcast log.  Entries double as the announcements guardians see.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;

use es_directory::BroadcastRecord;

use super::{internal_error, TenantQuery};
use crate::state::AppState;

/// `GET /api/broadcast/history`
pub async fn history(State(state): State<AppState>, Query(q): Query<TenantQuery>) -> Response {
    let tenant = match q.tenant() {
        Ok(t) => t,
        Err(resp) => return resp,
    };
    match state.feed.list_broadcasts(tenant, q.limit_or(20)).await {
        Ok(logs) => Json(logs).into_response(),
        Err(e) => internal_error("listing broadcasts failed", e),
    }
}

/// `POST /api/broadcast/create`
pub async fn create(
    State(state): State<AppState>,
    Query(q): Query<TenantQuery>,
    Json(record): Json<BroadcastRecord>,
) -> Response {
    let tenant = match q.tenant() {
        Ok(t) => t,
        Err(resp) => return resp,
    };
    match state.feed.create_broadcast(tenant, record).await {
        Ok(id) => (StatusCode::CREATED, Json(json!({ "id": id }))).into_response(),
        Err(e) => internal_error("creating broadcast failed", e),
    }
}

//! Daily updates (homework and remarks) posted by teachers.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::{json, Map, Value};

use super::{internal_error, TenantQuery};
use crate::state::AppState;

/// `GET /api/daily-updates`
pub async fn list(State(state): State<AppState>, Query(q): Query<TenantQuery>) -> Response {
    let tenant = match q.tenant() {
        Ok(t) => t,
        Err(resp) => return resp,
    };
    match state.feed.list_updates(tenant, q.limit_or(20)).await {
        Ok(updates) => Json(updates).into_response(),
        Err(e) => internal_error("listing daily updates failed", e),
    }
}

/// `POST /api/daily-updates`
pub async fn add(
    State(state): State<AppState>,
    Query(q): Query<TenantQuery>,
    Json(update): Json<Map<String, Value>>,
) -> Response {
    let tenant = match q.tenant() {
        Ok(t) => t,
        Err(resp) => return resp,
    };
    match state.feed.add_update(tenant, update).await {
        Ok(id) => (StatusCode::CREATED, Json(json!({ "id": id }))).into_response(),
        Err(e) => internal_error("adding daily update failed", e),
    }
}

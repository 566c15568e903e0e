use axum::extract::{Query, State};
use axum::response::{IntoResponse, Json, Response};

use super::{internal_error, TenantQuery};
use crate::state::AppState;

/// `GET /api/analytics/dashboard/stats`
pub async fn dashboard_stats(State(state): State<AppState>, Query(q): Query<TenantQuery>) -> Response {
    let tenant = match q.tenant() {
        Ok(t) => t,
        Err(resp) => return resp,
    };
    match es_directory::dashboard_stats(
        &state.store,
        &state.cache,
        tenant,
        state.config.directory.feed_ttl_secs,
    )
    .await
    {
        Ok(stats) => Json(stats).into_response(),
        Err(e) => internal_error("dashboard stats failed", e),
    }
}

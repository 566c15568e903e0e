pub mod analytics;
pub mod auth;
pub mod broadcasts;
pub mod email;
pub mod health;
pub mod students;
pub mod tutor;
pub mod updates;
pub mod webhook;
pub mod whatsapp;

use axum::http::StatusCode;
use axum::middleware;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post, put};
use axum::Router;
use serde::Deserialize;

use crate::state::AppState;

/// Build the full API router.
///
/// Routes are split into **public** (health check and the provider webhook,
/// which carries its own handshake and signature check) and **protected**
/// (gated behind the bearer-token middleware).
///
/// `state` is needed to wire up the auth middleware at build time.
pub fn router(state: AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/health", get(health::health))
        .route("/api/webhook", get(webhook::verify).post(webhook::receive));

    let protected = Router::new()
        // Outbound messaging
        .route("/api/whatsapp/notify", post(whatsapp::notify))
        .route("/api/whatsapp/batch-notify", post(whatsapp::batch_notify))
        .route("/api/email/send", post(email::send))
        .route("/api/email/batch", post(email::batch))
        // Tutor
        .route("/api/ai-tutor/ask", post(tutor::ask))
        // Students
        .route("/api/students", get(students::list))
        .route("/api/students/add", post(students::add))
        .route("/api/students/batch", post(students::batch_add))
        .route("/api/students/update", put(students::update))
        .route("/api/students/contacts", get(students::contacts))
        // Daily updates
        .route("/api/daily-updates", get(updates::list).post(updates::add))
        // Broadcasts
        .route("/api/broadcast/history", get(broadcasts::history))
        .route("/api/broadcast/create", post(broadcasts::create))
        // Analytics
        .route("/api/analytics/dashboard/stats", get(analytics::dashboard_stats))
        // Apply API auth middleware to all protected routes.
        .route_layer(middleware::from_fn_with_state(
            state,
            auth::require_api_token,
        ));

    public.merge(protected)
}

/// Build a standardized JSON error response: `{ "error": "<message>" }`.
pub(crate) fn api_error(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(serde_json::json!({ "error": message.into() }))).into_response()
}

/// Logs the underlying error and returns a generic 500.
pub(crate) fn internal_error(context: &str, e: impl std::fmt::Display) -> Response {
    tracing::error!(error = %e, "{context}");
    api_error(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
}

/// `?schoolId=` carried by every tenant-scoped data route.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantQuery {
    #[serde(default)]
    pub school_id: Option<String>,
    #[serde(default)]
    pub limit: Option<String>,
}

impl TenantQuery {
    /// The tenant id, or the 400 response for a missing one.
    pub(crate) fn tenant(&self) -> Result<&str, Response> {
        self.school_id
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| api_error(StatusCode::BAD_REQUEST, "Missing schoolId"))
    }

    /// `limit` as sent, falling back to `default` when absent or not a number.
    pub(crate) fn limit_or(&self, default: usize) -> usize {
        parse_limit(self.limit.as_deref(), default)
    }
}

pub(crate) fn parse_limit(raw: Option<&str>, default: usize) -> usize {
    raw.and_then(|l| l.trim().parse::<usize>().ok())
        .filter(|&n| n > 0)
        .unwrap_or(default)
}

//! Outbound chat broadcasts over HTTP.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Deserialize;
use serde_json::{json, Map, Value};

use es_messaging::{Choice, TemplateMessage};

use crate::runtime::batch::{self, MessageSpec, Recipient};
use crate::runtime::notify;
use crate::state::AppState;

fn failure(status: StatusCode, error: &str) -> Response {
    (status, Json(json!({ "success": false, "error": error }))).into_response()
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// POST /api/whatsapp/notify
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Deserialize)]
pub struct NotifyRequest {
    #[serde(default)]
    pub to: Value,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub data: Option<Map<String, Value>>,
}

/// Typed notification to one or many guardians.
pub async fn notify(State(state): State<AppState>, Json(req): Json<NotifyRequest>) -> Response {
    let recipients = notify::collect_recipients(&req.to);
    let (Some(kind), Some(data)) = (req.kind.filter(|k| !k.is_empty()), req.data) else {
        return failure(StatusCode::BAD_REQUEST, "Missing required fields: to, type, or data");
    };
    if recipients.is_empty() {
        return failure(StatusCode::BAD_REQUEST, "Missing required fields: to, type, or data");
    }

    let spec = notify::render(&kind, &data);
    tracing::info!(kind = %kind, recipients = recipients.len(), "typed notification");

    let report = batch::dispatch(
        state.channel.clone(),
        recipients.into_iter().map(Recipient::Phone).collect(),
        &spec,
        state.plan,
        &state.config.whatsapp.default_country_code,
    )
    .await;

    Json(json!({
        "success": true,
        "sentCount": report.success_count,
        "failedCount": report.failure_count,
        "details": report,
    }))
    .into_response()
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// POST /api/whatsapp/batch-notify
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Deserialize)]
pub struct BatchNotifyRequest {
    #[serde(default)]
    pub to: Option<Vec<Recipient>>,
    #[serde(default)]
    pub text: Option<String>,
    /// Quick-reply buttons sent with the text (at most three are kept).
    #[serde(default)]
    pub choices: Vec<Choice>,
    /// Sends a provider template instead of text.
    #[serde(default)]
    pub template: Option<TemplateMessage>,
}

/// Broadcast one message to many recipients through the batch engine.
pub async fn batch_notify(
    State(state): State<AppState>,
    Json(req): Json<BatchNotifyRequest>,
) -> Response {
    let Some(recipients) = req.to.filter(|r| !r.is_empty()) else {
        return failure(StatusCode::BAD_REQUEST, "Invalid recipients list");
    };

    let spec = match (req.template, req.text.filter(|t| !t.trim().is_empty())) {
        (Some(template), _) => MessageSpec::Template(template),
        (None, Some(body)) => MessageSpec::Text {
            body,
            choices: req.choices,
        },
        (None, None) => return failure(StatusCode::BAD_REQUEST, "Missing message text"),
    };

    tracing::info!(recipients = recipients.len(), "starting chat broadcast");
    let report = batch::dispatch(
        state.channel.clone(),
        recipients,
        &spec,
        state.plan,
        &state.config.whatsapp.default_country_code,
    )
    .await;

    Json(json!({
        "success": true,
        "message": "Batch processing completed",
        "details": report,
    }))
    .into_response()
}

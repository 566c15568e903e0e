//! Email endpoints: a single message, and a paced broadcast that sends one
//! email per address.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Deserialize;
use serde_json::{json, Value};

use es_messaging::Email;

use crate::runtime::batch;
use crate::state::AppState;

fn failure(status: StatusCode, error: impl Into<String>) -> Response {
    (status, Json(json!({ "success": false, "error": error.into() }))).into_response()
}

#[derive(Debug, Deserialize)]
pub struct EmailRequest {
    /// One address, a comma-separated list, or an array.
    #[serde(default)]
    pub to: Value,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub html: Option<String>,
}

/// Addresses from a string (comma-separated) or an array of strings.
fn addresses(to: &Value) -> Vec<String> {
    let raw: Vec<&str> = match to {
        Value::String(s) => s.split(',').collect(),
        Value::Array(items) => items.iter().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
    };
    let mut out: Vec<String> = Vec::new();
    for addr in raw.into_iter().map(str::trim).filter(|a| !a.is_empty()) {
        if !out.iter().any(|seen| seen == addr) {
            out.push(addr.to_owned());
        }
    }
    out
}

fn non_empty(v: Option<String>) -> Option<String> {
    v.filter(|s| !s.trim().is_empty())
}

/// `POST /api/email/send`
pub async fn send(State(state): State<AppState>, Json(req): Json<EmailRequest>) -> Response {
    let to = addresses(&req.to);
    let (Some(subject), Some(text)) = (non_empty(req.subject), non_empty(req.text)) else {
        return failure(StatusCode::BAD_REQUEST, "Missing required fields");
    };
    if to.is_empty() {
        return failure(StatusCode::BAD_REQUEST, "Missing required fields");
    }
    let Some(mailer) = &state.mailer else {
        return failure(StatusCode::SERVICE_UNAVAILABLE, "email is not configured");
    };

    let email = Email {
        to,
        subject,
        text,
        html: non_empty(req.html),
    };
    match mailer.send(&email).await {
        Ok(message_id) => Json(json!({ "success": true, "messageId": message_id })).into_response(),
        Err(e) => {
            tracing::error!(error = %e, recipients = email.to.len(), "email send failed");
            failure(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

/// `POST /api/email/batch`
pub async fn batch(State(state): State<AppState>, Json(req): Json<EmailRequest>) -> Response {
    let to = match &req.to {
        Value::Array(_) => addresses(&req.to),
        _ => Vec::new(),
    };
    if to.is_empty() {
        return failure(StatusCode::BAD_REQUEST, "Invalid recipients list");
    }
    let (Some(subject), Some(text)) = (non_empty(req.subject), non_empty(req.text)) else {
        return failure(StatusCode::BAD_REQUEST, "Missing required fields");
    };
    let Some(mailer) = state.mailer.clone() else {
        return failure(StatusCode::SERVICE_UNAVAILABLE, "email is not configured");
    };

    tracing::info!(recipients = to.len(), "starting email broadcast");
    let template = Email {
        to: Vec::new(),
        subject,
        text,
        html: non_empty(req.html),
    };
    let report = batch::dispatch_email(mailer, to, &template, state.plan).await;

    Json(json!({
        "success": true,
        "message": "Batch processing completed",
        "details": report,
    }))
    .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn addresses_split_and_dedupe() {
        assert_eq!(
            addresses(&json!("a@x.org, b@x.org,a@x.org")),
            vec!["a@x.org", "b@x.org"]
        );
        assert_eq!(addresses(&json!(["a@x.org", "", 3])), vec!["a@x.org"]);
        assert!(addresses(&Value::Null).is_empty());
    }
}

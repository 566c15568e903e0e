//! Provider webhook: the subscription handshake and event delivery.
//!
//! Event delivery is public but, when an app secret is configured, every
//! body must carry `X-Hub-Signature-256: sha256=<hex>` computed over the raw
//! bytes.  Accepted deliveries are always acknowledged with 200, whatever
//! the conversation turn did, so the provider never redelivers.

use std::collections::HashMap;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use hmac::{Hmac, Mac};
use serde_json::Value;
use sha2::Sha256;
use subtle::ConstantTimeEq;

use super::api_error;
use crate::runtime::InboundMessage;
use crate::state::AppState;

type HmacSha256 = Hmac<Sha256>;

/// `GET /api/webhook`: echo `hub.challenge` when the verify token matches.
pub async fn verify(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let mode = params.get("hub.mode").filter(|s| !s.is_empty());
    let token = params.get("hub.verify_token").filter(|s| !s.is_empty());

    let (Some(mode), Some(token)) = (mode, token) else {
        return StatusCode::BAD_REQUEST.into_response();
    };

    let token_ok = state
        .verify_token
        .as_deref()
        .map(|expected| bool::from(expected.as_bytes().ct_eq(token.as_bytes())))
        .unwrap_or(false);

    if mode == "subscribe" && token_ok {
        tracing::info!("webhook verified");
        let challenge = params.get("hub.challenge").cloned().unwrap_or_default();
        (StatusCode::OK, challenge).into_response()
    } else {
        tracing::warn!(mode = %mode, "webhook verification refused");
        StatusCode::FORBIDDEN.into_response()
    }
}

/// `POST /api/webhook`: one event delivery.
pub async fn receive(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    if let Some(secret) = &state.app_secret {
        let sig_header = headers
            .get("x-hub-signature-256")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        if !signature_matches(secret, &body, sig_header) {
            tracing::warn!("webhook delivery with invalid signature");
            return api_error(StatusCode::UNAUTHORIZED, "invalid webhook signature");
        }
    }

    let payload: Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) => {
            tracing::debug!(error = %e, "webhook body is not JSON");
            return api_error(StatusCode::BAD_REQUEST, "invalid JSON body");
        }
    };

    if payload.get("object").map_or(true, Value::is_null) {
        return StatusCode::NOT_FOUND.into_response();
    }

    match InboundMessage::from_webhook(&payload) {
        Some(message) => {
            let outcome = state.dispatcher.handle(&message).await;
            tracing::debug!(outcome = outcome.as_str(), "webhook message handled");
        }
        None => tracing::debug!("webhook event without a message acknowledged"),
    }

    (StatusCode::OK, "EVENT_RECEIVED").into_response()
}

/// Check a `sha256=<hex>` signature header against `body`.
pub fn signature_matches(secret: &str, body: &[u8], header: &str) -> bool {
    let sig_hex = header.strip_prefix("sha256=").unwrap_or(header);

    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(body);
    let computed = hex::encode(mac.finalize().into_bytes());

    computed.as_bytes().ct_eq(sig_hex.as_bytes()).unwrap_u8() == 1
}

/// Signature header value for `body`.
pub fn sign(secret: &str, body: &[u8]) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(body);
    format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
}

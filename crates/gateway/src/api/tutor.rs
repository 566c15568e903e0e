use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Deserialize;
use serde_json::json;

use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    #[serde(default)]
    pub question: Option<String>,
}

fn failure(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "success": false, "message": message }))).into_response()
}

/// `POST /api/ai-tutor/ask`
pub async fn ask(State(state): State<AppState>, Json(req): Json<AskRequest>) -> Response {
    let Some(question) = req.question.filter(|q| !q.trim().is_empty()) else {
        return failure(StatusCode::BAD_REQUEST, "Question is required");
    };
    let Some(tutor) = &state.tutor else {
        return failure(StatusCode::SERVICE_UNAVAILABLE, "Tutor is not configured");
    };

    match tutor.ask(&question).await {
        Ok(answer) => Json(json!({ "success": true, "data": { "answer": answer } })).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "tutor answer failed");
            failure(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
        }
    }
}

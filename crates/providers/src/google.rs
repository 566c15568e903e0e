//! Google Gemini adapter.
//!
//! One `generateContent` call per question, with the tutor persona sent as
//! `systemInstruction`.  Auth is via an API key passed as a query parameter
//! (`key={api_key}`).

use std::time::Duration;

use serde_json::{json, Value};

use es_domain::config::TutorConfig;
use es_domain::error::{Error, Result};

use crate::traits::AnswerBackend;
use crate::util::{from_reqwest, redact_url_key, resolve_api_key};

/// Persona used when the config does not override it.
pub const DEFAULT_SYSTEM_PROMPT: &str = "\
You are Lumina, a professional, friendly, and encouraging AI Tutor dedicated to helping students from grades LKG to 12.
Your goal is to explain concepts clearly, accurately, and in an engaging manner suitable for the student's level.

GUIDELINES:
- Be Encouraging: Use positive reinforcement.
- Be Clear: Break down complex topics into simple, digestible steps.
- Adaptability: If a question seems simple (primary school level), use simple language and analogies. If it's advanced (high school), be rigorous and precise.
- Professionalism: Maintain a supportive and respectful tone at all times.
- Safety: Prioritize educational value and student safety.
- Conciseness: Provide direct answers but offer to expand if needed.

Do not burden the student with technical details about your underlying systems. Just focus on being a great teacher.";

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Adapter struct
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub struct GeminiTutor {
    base_url: String,
    model: String,
    api_key: String,
    system_prompt: String,
    client: reqwest::Client,
}

impl GeminiTutor {
    /// Fails with `Error::Config` when the API key env var is unset.
    pub fn from_config(cfg: &TutorConfig) -> Result<Self> {
        let api_key = resolve_api_key(&cfg.api_key_env)?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()
            .map_err(from_reqwest)?;

        Ok(Self {
            base_url: cfg.api_base.trim_end_matches('/').to_string(),
            model: cfg.model.clone(),
            api_key,
            system_prompt: cfg
                .system_prompt
                .clone()
                .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
            client,
        })
    }

    fn generate_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        )
    }
}

fn build_body(system_prompt: &str, question: &str) -> Value {
    json!({
        "systemInstruction": { "parts": [{ "text": system_prompt }] },
        "contents": [{ "role": "user", "parts": [{ "text": question }] }],
    })
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Response deserialization
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

fn parse_answer(body: &Value) -> Result<String> {
    let candidate = body
        .get("candidates")
        .and_then(|c| c.as_array())
        .and_then(|a| a.first())
        .ok_or_else(|| Error::Provider {
            provider: "google".into(),
            message: "no candidates in response".into(),
        })?;

    let text: String = candidate
        .get("content")
        .and_then(|c| c.get("parts"))
        .and_then(|p| p.as_array())
        .map(|parts| {
            parts
                .iter()
                .filter_map(|p| p.get("text").and_then(|v| v.as_str()))
                .collect()
        })
        .unwrap_or_default();

    if text.trim().is_empty() {
        let reason = candidate
            .get("finishReason")
            .and_then(|v| v.as_str())
            .unwrap_or("unknown");
        return Err(Error::Provider {
            provider: "google".into(),
            message: format!("empty answer (finishReason: {reason})"),
        });
    }
    Ok(text)
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Trait implementation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[async_trait::async_trait]
impl AnswerBackend for GeminiTutor {
    fn name(&self) -> &str {
        "google"
    }

    async fn answer(&self, question: &str) -> Result<String> {
        let url = self.generate_url();
        tracing::debug!(model = %self.model, url = %redact_url_key(&url), "gemini tutor request");

        let resp = self
            .client
            .post(&url)
            .json(&build_body(&self.system_prompt, question))
            .send()
            .await
            .map_err(from_reqwest)?;

        let status = resp.status();
        let resp_text = resp.text().await.map_err(from_reqwest)?;

        if !status.is_success() {
            return Err(Error::Provider {
                provider: "google".into(),
                message: format!("HTTP {} - {}", status.as_u16(), resp_text),
            });
        }

        let resp_json: Value = serde_json::from_str(&resp_text)?;
        parse_answer(&resp_json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_carries_system_instruction_and_question() {
        let body = build_body("persona", "What is photosynthesis?");
        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "persona");
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(
            body["contents"][0]["parts"][0]["text"],
            "What is photosynthesis?"
        );
    }

    #[test]
    fn parse_joins_text_parts() {
        let body = json!({
            "candidates": [{
                "content": { "parts": [{ "text": "Plants " }, { "text": "make food." }] },
                "finishReason": "STOP"
            }]
        });
        assert_eq!(parse_answer(&body).unwrap(), "Plants make food.");
    }

    #[test]
    fn parse_rejects_missing_or_empty_candidates() {
        assert!(parse_answer(&json!({ "candidates": [] })).is_err());
        let blocked = json!({ "candidates": [{ "finishReason": "SAFETY" }] });
        let err = parse_answer(&blocked).unwrap_err().to_string();
        assert!(err.contains("SAFETY"));
    }

    #[test]
    fn missing_key_fails_construction() {
        let cfg = TutorConfig {
            api_key_env: "ES_TEST_UNSET_GEMINI_KEY".into(),
            ..TutorConfig::default()
        };
        assert!(matches!(GeminiTutor::from_config(&cfg), Err(Error::Config(_))));
    }
}

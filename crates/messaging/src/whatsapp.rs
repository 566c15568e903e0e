//! WhatsApp Cloud API client.
//!
//! Every send is one `POST {api_base}/{version}/{phone_number_id}/messages`
//! with a bearer token.  Credentials are read from the environment once at
//! construction; when absent the client still builds and each send returns
//! `Error::Config` so callers can count it as an ordinary failure.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use es_domain::config::WhatsAppConfig;
use es_domain::error::{Error, Result};

use crate::channel::{clamp_choices, Choice, MessagingChannel, TemplateMessage};

fn from_reqwest(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::Timeout(e.to_string())
    } else {
        Error::Http(e.to_string())
    }
}

#[derive(Clone)]
struct Credentials {
    access_token: String,
    phone_number_id: String,
}

pub struct WhatsAppCloudClient {
    base_url: String,
    credentials: Option<Credentials>,
    missing_hint: String,
    client: reqwest::Client,
}

impl WhatsAppCloudClient {
    pub fn from_config(cfg: &WhatsAppConfig) -> Result<Self> {
        let token = read_env(&cfg.access_token_env);
        let phone_id = read_env(&cfg.phone_number_id_env);
        let credentials = match (token, phone_id) {
            (Some(access_token), Some(phone_number_id)) => Some(Credentials {
                access_token,
                phone_number_id,
            }),
            _ => {
                tracing::warn!(
                    hint = %format!("set {} and {}", cfg.access_token_env, cfg.phone_number_id_env),
                    "WhatsApp credentials missing, outbound messages will fail"
                );
                None
            }
        };
        Self::build(cfg, credentials)
    }

    /// Client with explicit credentials (tests, tooling).
    pub fn with_credentials(
        cfg: &WhatsAppConfig,
        access_token: &str,
        phone_number_id: &str,
    ) -> Result<Self> {
        Self::build(
            cfg,
            Some(Credentials {
                access_token: access_token.to_owned(),
                phone_number_id: phone_number_id.to_owned(),
            }),
        )
    }

    fn build(cfg: &WhatsAppConfig, credentials: Option<Credentials>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()
            .map_err(from_reqwest)?;
        Ok(Self {
            base_url: format!(
                "{}/{}",
                cfg.api_base.trim_end_matches('/'),
                cfg.api_version.trim_matches('/')
            ),
            credentials,
            missing_hint: format!(
                "missing WhatsApp credentials ({} / {})",
                cfg.access_token_env, cfg.phone_number_id_env
            ),
            client,
        })
    }

    pub fn has_credentials(&self) -> bool {
        self.credentials.is_some()
    }

    pub fn messages_url(&self, phone_number_id: &str) -> String {
        format!("{}/{}/messages", self.base_url, phone_number_id)
    }

    async fn post(&self, payload: Value) -> Result<()> {
        let creds = self
            .credentials
            .as_ref()
            .ok_or_else(|| Error::Config(self.missing_hint.clone()))?;

        let resp = self
            .client
            .post(self.messages_url(&creds.phone_number_id))
            .bearer_auth(&creds.access_token)
            .json(&payload)
            .send()
            .await
            .map_err(from_reqwest)?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), body = %body, "WhatsApp send rejected");
            return Err(Error::Provider {
                provider: "whatsapp".into(),
                message: format!("HTTP {} - {}", status.as_u16(), body),
            });
        }
        Ok(())
    }
}

fn read_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Payloads
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub fn text_payload(to: &str, body: &str) -> Value {
    json!({
        "messaging_product": "whatsapp",
        "to": to,
        "type": "text",
        "text": { "body": body },
    })
}

pub fn interactive_payload(to: &str, body: &str, choices: &[Choice]) -> Value {
    let buttons: Vec<Value> = clamp_choices(choices)
        .into_iter()
        .map(|c| json!({ "type": "reply", "reply": { "id": c.id, "title": c.label } }))
        .collect();
    json!({
        "messaging_product": "whatsapp",
        "to": to,
        "type": "interactive",
        "interactive": {
            "type": "button",
            "body": { "text": body },
            "action": { "buttons": buttons },
        },
    })
}

pub fn url_action_payload(to: &str, body: &str, label: &str, url: &str) -> Value {
    let label = if label.trim().is_empty() { "Open Link" } else { label };
    json!({
        "messaging_product": "whatsapp",
        "to": to,
        "type": "interactive",
        "interactive": {
            "type": "cta_url",
            "body": { "text": body },
            "action": {
                "name": "cta_url",
                "parameters": { "display_text": label, "url": url },
            },
        },
    })
}

pub fn template_payload(to: &str, template: &TemplateMessage) -> Value {
    json!({
        "messaging_product": "whatsapp",
        "to": to,
        "type": "template",
        "template": {
            "name": template.name,
            "language": { "code": template.language_code },
            "components": template.components,
        },
    })
}

pub fn mark_read_payload(message_id: &str) -> Value {
    json!({
        "messaging_product": "whatsapp",
        "status": "read",
        "message_id": message_id,
    })
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Trait implementation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[async_trait]
impl MessagingChannel for WhatsAppCloudClient {
    fn name(&self) -> &'static str {
        "whatsapp"
    }

    async fn send_text(&self, to: &str, body: &str) -> Result<()> {
        self.post(text_payload(to, body)).await
    }

    async fn send_interactive(&self, to: &str, body: &str, choices: &[Choice]) -> Result<()> {
        if choices.is_empty() {
            return self.send_text(to, body).await;
        }
        self.post(interactive_payload(to, body, choices)).await
    }

    async fn send_url_action(&self, to: &str, body: &str, label: &str, url: &str) -> Result<()> {
        self.post(url_action_payload(to, body, label, url)).await
    }

    async fn send_template(&self, to: &str, template: &TemplateMessage) -> Result<()> {
        self.post(template_payload(to, template)).await
    }

    async fn mark_read(&self, message_id: &str) -> Result<()> {
        self.post(mark_read_payload(message_id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interactive_payload_applies_limits() {
        let choices: Vec<Choice> = ["A", "B", "C", "D"]
            .iter()
            .map(|id| Choice::new(*id, "Label that is far too long to fit"))
            .collect();
        let p = interactive_payload("919876543210", "Pick one", &choices);
        let buttons = p["interactive"]["action"]["buttons"].as_array().unwrap();
        assert_eq!(buttons.len(), 3);
        assert_eq!(buttons[0]["reply"]["id"], "A");
        assert_eq!(buttons[0]["reply"]["title"].as_str().unwrap().chars().count(), 20);
        assert_eq!(p["interactive"]["body"]["text"], "Pick one");
    }

    #[test]
    fn url_action_payload_defaults_label() {
        let p = url_action_payload("1", "Body", " ", "https://example.com/x");
        assert_eq!(p["interactive"]["type"], "cta_url");
        assert_eq!(
            p["interactive"]["action"]["parameters"]["display_text"],
            "Open Link"
        );
        assert_eq!(
            p["interactive"]["action"]["parameters"]["url"],
            "https://example.com/x"
        );
    }

    #[test]
    fn template_payload_carries_language_and_components() {
        let mut t = TemplateMessage::new("hello_world");
        t.components.push(json!({"type": "body", "parameters": []}));
        let p = template_payload("1", &t);
        assert_eq!(p["template"]["name"], "hello_world");
        assert_eq!(p["template"]["language"]["code"], "en_US");
        assert_eq!(p["template"]["components"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn mark_read_payload_shape() {
        let p = mark_read_payload("wamid.123");
        assert_eq!(p["status"], "read");
        assert_eq!(p["message_id"], "wamid.123");
    }

    #[test]
    fn messages_url_includes_version_and_phone_id() {
        let cfg = WhatsAppConfig::default();
        let client = WhatsAppCloudClient::with_credentials(&cfg, "tok", "12345").unwrap();
        assert_eq!(
            client.messages_url("12345"),
            format!("{}/{}/12345/messages", cfg.api_base.trim_end_matches('/'), cfg.api_version)
        );
    }

    #[tokio::test]
    async fn missing_credentials_fail_as_config_error() {
        let cfg = WhatsAppConfig {
            access_token_env: "ES_TEST_UNSET_WA_TOKEN".into(),
            phone_number_id_env: "ES_TEST_UNSET_WA_PHONE".into(),
            ..WhatsAppConfig::default()
        };
        let client = WhatsAppCloudClient::from_config(&cfg).unwrap();
        assert!(!client.has_credentials());
        let err = client.send_text("919876543210", "hi").await.unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}

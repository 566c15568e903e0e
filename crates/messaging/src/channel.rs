use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use es_domain::error::Result;
use es_domain::trace::TraceEvent;

/// Most quick-reply choices one interactive message may carry.
pub const MAX_CHOICES: usize = 3;
/// Longest choice label the provider accepts, in characters.
pub const CHOICE_LABEL_LIMIT: usize = 20;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Message parts
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A quick-reply button.  `id` comes back verbatim when tapped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub id: String,
    pub label: String,
}

impl Choice {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }
}

/// Apply the provider limits: keep the first [`MAX_CHOICES`] choices and
/// cut each label to [`CHOICE_LABEL_LIMIT`] characters.
pub fn clamp_choices(choices: &[Choice]) -> Vec<Choice> {
    choices
        .iter()
        .take(MAX_CHOICES)
        .map(|c| Choice {
            id: c.id.clone(),
            label: c.label.chars().take(CHOICE_LABEL_LIMIT).collect(),
        })
        .collect()
}

/// A pre-approved provider template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateMessage {
    pub name: String,
    #[serde(default = "d_language")]
    pub language_code: String,
    /// Provider-shaped component objects (header/body parameters).
    #[serde(default)]
    pub components: Vec<Value>,
}

impl TemplateMessage {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            language_code: d_language(),
            components: Vec::new(),
        }
    }
}

fn d_language() -> String {
    "en_US".into()
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// MessagingChannel trait
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Outbound chat capability.
///
/// `to` must already be in the provider's international digit format.
/// Missing credentials surface as `Error::Config`, never as a panic.
#[async_trait]
pub trait MessagingChannel: Send + Sync {
    /// Short label for logs (`"whatsapp"`).
    fn name(&self) -> &'static str;

    async fn send_text(&self, to: &str, body: &str) -> Result<()>;

    /// Send a message with quick-reply choices.  Implementations apply
    /// [`clamp_choices`].
    async fn send_interactive(&self, to: &str, body: &str, choices: &[Choice]) -> Result<()>;

    /// Send a message with a single link button.
    async fn send_url_action(&self, to: &str, body: &str, label: &str, url: &str) -> Result<()>;

    async fn send_template(&self, to: &str, template: &TemplateMessage) -> Result<()>;

    /// Mark an inbound message as read.
    async fn mark_read(&self, message_id: &str) -> Result<()>;
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// OutboundMessage
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Any one message the system can send, as a value.
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundMessage {
    Text {
        body: String,
    },
    Interactive {
        body: String,
        choices: Vec<Choice>,
    },
    UrlAction {
        body: String,
        label: String,
        url: String,
    },
    Template(TemplateMessage),
}

impl OutboundMessage {
    pub fn text(body: impl Into<String>) -> Self {
        Self::Text { body: body.into() }
    }

    /// Interactive message, or plain text when there are no choices.
    pub fn with_choices(body: impl Into<String>, choices: Vec<Choice>) -> Self {
        if choices.is_empty() {
            Self::Text { body: body.into() }
        } else {
            Self::Interactive {
                body: body.into(),
                choices,
            }
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Text { .. } => "text",
            Self::Interactive { .. } => "interactive",
            Self::UrlAction { .. } => "url_action",
            Self::Template(_) => "template",
        }
    }

    /// The message body, if it has one.
    pub fn body(&self) -> Option<&str> {
        match self {
            Self::Text { body } | Self::Interactive { body, .. } | Self::UrlAction { body, .. } => {
                Some(body.as_str())
            }
            Self::Template(_) => None,
        }
    }

    /// Send through `channel`, emitting a trace event with the outcome.
    pub async fn send_via(&self, channel: &dyn MessagingChannel, to: &str) -> Result<()> {
        let result = match self {
            Self::Text { body } => channel.send_text(to, body).await,
            Self::Interactive { body, choices } => channel.send_interactive(to, body, choices).await,
            Self::UrlAction { body, label, url } => {
                channel.send_url_action(to, body, label, url).await
            }
            Self::Template(t) => channel.send_template(to, t).await,
        };
        TraceEvent::MessageSent {
            channel: channel.name().into(),
            kind: self.kind().into(),
            ok: result.is_ok(),
        }
        .emit();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_keeps_three_and_truncates_by_chars() {
        let choices: Vec<Choice> = (0..5)
            .map(|i| Choice::new(format!("id{i}"), "👤 A very long student name indeed"))
            .collect();
        let clamped = clamp_choices(&choices);
        assert_eq!(clamped.len(), MAX_CHOICES);
        assert_eq!(clamped[0].id, "id0");
        assert_eq!(clamped[0].label.chars().count(), CHOICE_LABEL_LIMIT);
        assert!(clamped[0].label.starts_with('👤'));
    }

    #[test]
    fn empty_choices_degrade_to_text() {
        assert_eq!(OutboundMessage::with_choices("hi", vec![]).kind(), "text");
        assert_eq!(
            OutboundMessage::with_choices("hi", vec![Choice::new("A", "a")]).kind(),
            "interactive"
        );
    }

    #[test]
    fn template_deserializes_with_default_language() {
        let t: TemplateMessage = serde_json::from_str(r#"{"name": "hello_world"}"#).unwrap();
        assert_eq!(t.language_code, "en_US");
        assert!(t.components.is_empty());
    }
}

//! Inbound webhook event parsing.
//!
//! A delivery carries at most one message (`entry[0].changes[0].value
//! .messages[0]`).  Status updates and other event kinds parse to `None`
//! and are acknowledged without side effects.

use serde_json::Value;

use super::command::Command;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundContent {
    /// Typed text.
    Text(String),
    /// A tapped quick-reply button, by id.
    Reply(String),
    /// Media, location, reactions and the like.
    Unsupported(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// Sender as delivered by the provider (international digits).
    pub from: String,
    pub message_id: Option<String>,
    pub content: InboundContent,
}

impl InboundMessage {
    pub fn text(from: &str, body: &str) -> Self {
        Self {
            from: from.to_owned(),
            message_id: None,
            content: InboundContent::Text(body.to_owned()),
        }
    }

    pub fn reply(from: &str, id: &str) -> Self {
        Self {
            from: from.to_owned(),
            message_id: None,
            content: InboundContent::Reply(id.to_owned()),
        }
    }

    pub fn command(&self) -> Command {
        match &self.content {
            InboundContent::Text(body) => Command::from_text(body),
            InboundContent::Reply(id) => Command::from_reply_id(id),
            InboundContent::Unsupported(_) => Command::Unknown,
        }
    }

    /// Extract the single message of a webhook delivery, if any.
    pub fn from_webhook(body: &Value) -> Option<Self> {
        let message = body
            .pointer("/entry/0/changes/0/value/messages/0")
            .filter(|m| m.is_object())?;
        let from = message.get("from").and_then(Value::as_str)?.to_owned();
        let message_id = message.get("id").and_then(Value::as_str).map(str::to_owned);
        let kind = message.get("type").and_then(Value::as_str).unwrap_or("");

        let content = match kind {
            "text" => InboundContent::Text(
                message
                    .pointer("/text/body")
                    .and_then(Value::as_str)
                    .unwrap_or("")
                    .to_owned(),
            ),
            "interactive" => match message
                .pointer("/interactive/button_reply/id")
                .or_else(|| message.pointer("/interactive/list_reply/id"))
                .and_then(Value::as_str)
            {
                Some(id) => InboundContent::Reply(id.to_owned()),
                None => InboundContent::Unsupported(kind.to_owned()),
            },
            // Quick-reply buttons on template messages.
            "button" => match message.pointer("/button/payload").and_then(Value::as_str) {
                Some(payload) => InboundContent::Reply(payload.to_owned()),
                None => InboundContent::Unsupported(kind.to_owned()),
            },
            other => InboundContent::Unsupported(other.to_owned()),
        };

        Some(Self {
            from,
            message_id,
            content,
        })
    }
}

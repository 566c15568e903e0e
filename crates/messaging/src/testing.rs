//! In-memory channel and mailer that record what they were asked to send.
//!
//! Used by the gateway's tests to observe replies, batch pacing and
//! per-recipient failures without any network.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::time::Instant;

use es_domain::error::{Error, Result};

use crate::channel::{Choice, MessagingChannel, OutboundMessage, TemplateMessage};
use crate::email::{Email, EmailTransport};

/// One send attempt as seen by [`RecordingChannel`].
#[derive(Debug, Clone)]
pub struct SentMessage {
    pub to: String,
    pub message: OutboundMessage,
    pub started: Instant,
    pub finished: Instant,
    pub ok: bool,
}

#[derive(Default)]
pub struct RecordingChannel {
    sent: Mutex<Vec<SentMessage>>,
    read_receipts: Mutex<Vec<String>>,
    failing: HashSet<String>,
    latency: Duration,
}

impl RecordingChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sends to any of `recipients` fail with a provider error.
    pub fn failing_for<I, S>(mut self, recipients: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.failing = recipients.into_iter().map(Into::into).collect();
        self
    }

    /// Each send sleeps this long before settling.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().clone()
    }

    pub fn sent_to(&self, to: &str) -> Vec<OutboundMessage> {
        self.sent
            .lock()
            .iter()
            .filter(|s| s.to == to)
            .map(|s| s.message.clone())
            .collect()
    }

    pub fn read_receipts(&self) -> Vec<String> {
        self.read_receipts.lock().clone()
    }

    async fn record(&self, to: &str, message: OutboundMessage) -> Result<()> {
        let started = Instant::now();
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let ok = !self.failing.contains(to);
        self.sent.lock().push(SentMessage {
            to: to.to_owned(),
            message,
            started,
            finished: Instant::now(),
            ok,
        });
        if ok {
            Ok(())
        } else {
            Err(Error::Provider {
                provider: "recording".into(),
                message: format!("rejected recipient {to}"),
            })
        }
    }
}

#[async_trait]
impl MessagingChannel for RecordingChannel {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn send_text(&self, to: &str, body: &str) -> Result<()> {
        self.record(to, OutboundMessage::text(body)).await
    }

    async fn send_interactive(&self, to: &str, body: &str, choices: &[Choice]) -> Result<()> {
        self.record(to, OutboundMessage::with_choices(body, choices.to_vec()))
            .await
    }

    async fn send_url_action(&self, to: &str, body: &str, label: &str, url: &str) -> Result<()> {
        self.record(
            to,
            OutboundMessage::UrlAction {
                body: body.into(),
                label: label.into(),
                url: url.into(),
            },
        )
        .await
    }

    async fn send_template(&self, to: &str, template: &TemplateMessage) -> Result<()> {
        self.record(to, OutboundMessage::Template(template.clone()))
            .await
    }

    async fn mark_read(&self, message_id: &str) -> Result<()> {
        self.read_receipts.lock().push(message_id.to_owned());
        Ok(())
    }
}

/// Mailer that keeps every email and hands out sequential ids.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<Email>>,
    fail: bool,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            sent: Mutex::default(),
            fail: true,
        }
    }

    pub fn sent(&self) -> Vec<Email> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl EmailTransport for RecordingMailer {
    async fn send(&self, email: &Email) -> Result<String> {
        if self.fail {
            return Err(Error::Provider {
                provider: "recording".into(),
                message: "mailer unavailable".into(),
            });
        }
        let mut sent = self.sent.lock();
        sent.push(email.clone());
        Ok(format!("<{}@recording>", sent.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_and_fails_selected_recipients() {
        let channel = RecordingChannel::new().failing_for(["222"]);
        assert!(channel.send_text("111", "hello").await.is_ok());
        assert!(channel.send_text("222", "hello").await.is_err());

        let sent = channel.sent();
        assert_eq!(sent.len(), 2);
        assert!(sent[0].ok);
        assert!(!sent[1].ok);
        assert_eq!(channel.sent_to("111"), vec![OutboundMessage::text("hello")]);
    }

    #[tokio::test(start_paused = true)]
    async fn latency_shows_in_timestamps() {
        let channel = RecordingChannel::new().with_latency(Duration::from_millis(250));
        channel.send_text("111", "x").await.unwrap();
        let s = &channel.sent()[0];
        assert_eq!(s.finished - s.started, Duration::from_millis(250));
    }
}

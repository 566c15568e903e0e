//! Batch dispatch engine.
//!
//! Recipients are split into consecutive chunks.  A chunk's sends run
//! concurrently and must all settle before the next chunk starts; the
//! pause between chunks runs from that settlement.  Peak concurrency is
//! therefore the chunk size.  Each recipient's outcome is independent.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use es_domain::config::DispatchConfig;
use es_domain::error::{Error, Result};
use es_domain::phone;
use es_domain::trace::TraceEvent;
use es_messaging::{Choice, Email, EmailTransport, MessagingChannel, OutboundMessage, TemplateMessage};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Plan & report
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkPlan {
    pub chunk_size: usize,
    pub inter_chunk_delay: Duration,
}

impl ChunkPlan {
    pub fn new(chunk_size: usize, inter_chunk_delay: Duration) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            inter_chunk_delay,
        }
    }

    pub fn from_config(cfg: &DispatchConfig) -> Self {
        Self::new(cfg.chunk_size, Duration::from_millis(cfg.inter_chunk_delay_ms))
    }
}

impl Default for ChunkPlan {
    fn default() -> Self {
        Self::new(50, Duration::from_millis(1000))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipientError {
    pub recipient: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    pub success_count: usize,
    pub failure_count: usize,
    pub errors: Vec<RecipientError>,
}

/// Run `send` for every item, chunk by chunk.
///
/// `label` names an item in the error list.  Failures are recorded and
/// never stop the remaining sends.
pub async fn run_chunked<T, L, F, Fut>(
    channel: &str,
    items: Vec<T>,
    plan: ChunkPlan,
    label: L,
    send: F,
) -> BatchReport
where
    L: Fn(&T) -> String,
    F: Fn(T) -> Fut,
    Fut: Future<Output = Result<()>>,
{
    let started = Instant::now();
    let total = items.len();
    let mut report = BatchReport::default();
    let mut chunks = 0;

    let mut pending = items.into_iter().peekable();
    while pending.peek().is_some() {
        if chunks > 0 && !plan.inter_chunk_delay.is_zero() {
            tokio::time::sleep(plan.inter_chunk_delay).await;
        }
        let chunk: Vec<T> = pending.by_ref().take(plan.chunk_size).collect();
        let labels: Vec<String> = chunk.iter().map(&label).collect();
        let results = join_all(chunk.into_iter().map(&send)).await;

        for (recipient, result) in labels.into_iter().zip(results) {
            match result {
                Ok(()) => report.success_count += 1,
                Err(e) => {
                    tracing::warn!(recipient = %recipient, error = %e, "batch send failed");
                    report.failure_count += 1;
                    report.errors.push(RecipientError {
                        recipient,
                        error: e.to_string(),
                    });
                }
            }
        }
        chunks += 1;
        tracing::debug!(chunk = chunks, sent = report.success_count + report.failure_count, total, "batch chunk settled");
    }

    TraceEvent::BatchCompleted {
        channel: channel.into(),
        recipients: total,
        chunks,
        success_count: report.success_count,
        failure_count: report.failure_count,
        duration_ms: started.elapsed().as_millis() as u64,
    }
    .emit();
    report
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Chat broadcasts
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A recipient: a bare phone number, or an object with per-recipient
/// overrides.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Recipient {
    Phone(String),
    Detailed(RecipientDetail),
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipientDetail {
    #[serde(alias = "to", alias = "parentPhone")]
    pub phone: String,
    /// Replaces the broadcast text for this recipient.
    #[serde(default)]
    pub text: Option<String>,
    /// Replaces the template components for this recipient.
    #[serde(default)]
    pub components: Option<Vec<Value>>,
}

impl Recipient {
    pub fn phone(&self) -> &str {
        match self {
            Recipient::Phone(p) => p,
            Recipient::Detailed(d) => &d.phone,
        }
    }
}

impl From<&str> for Recipient {
    fn from(phone: &str) -> Self {
        Recipient::Phone(phone.to_owned())
    }
}

/// What every recipient of a broadcast receives, before overrides.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageSpec {
    Text { body: String, choices: Vec<Choice> },
    Template(TemplateMessage),
}

impl MessageSpec {
    pub fn text(body: impl Into<String>) -> Self {
        MessageSpec::Text {
            body: body.into(),
            choices: Vec::new(),
        }
    }

    /// The message for one recipient, with its overrides applied.
    pub fn render_for(&self, recipient: &Recipient) -> OutboundMessage {
        let detail = match recipient {
            Recipient::Detailed(d) => Some(d),
            Recipient::Phone(_) => None,
        };
        match self {
            MessageSpec::Text { body, choices } => {
                let body = detail
                    .and_then(|d| d.text.clone())
                    .unwrap_or_else(|| body.clone());
                OutboundMessage::with_choices(body, choices.clone())
            }
            MessageSpec::Template(template) => {
                let mut template = template.clone();
                if let Some(components) = detail.and_then(|d| d.components.clone()) {
                    template.components = components;
                }
                OutboundMessage::Template(template)
            }
        }
    }
}

/// Broadcast `spec` to every recipient through `channel`.
pub async fn dispatch(
    channel: Arc<dyn MessagingChannel>,
    recipients: Vec<Recipient>,
    spec: &MessageSpec,
    plan: ChunkPlan,
    country_code: &str,
) -> BatchReport {
    let name = channel.name();
    run_chunked(
        name,
        recipients,
        plan,
        |r| r.phone().to_owned(),
        |r| {
            let channel = channel.clone();
            let message = spec.render_for(&r);
            let to = phone::to_provider_format(r.phone(), country_code);
            async move {
                if to.is_empty() {
                    return Err(Error::Other("recipient has no phone digits".into()));
                }
                message.send_via(channel.as_ref(), &to).await
            }
        },
    )
    .await
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Email broadcasts
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Send `template` to each address as its own email.
pub async fn dispatch_email(
    mailer: Arc<dyn EmailTransport>,
    addresses: Vec<String>,
    template: &Email,
    plan: ChunkPlan,
) -> BatchReport {
    run_chunked(
        "email",
        addresses,
        plan,
        |addr| addr.clone(),
        |addr| {
            let mailer = mailer.clone();
            let email = Email {
                to: vec![addr],
                ..template.clone()
            };
            async move { mailer.send(&email).await.map(|_| ()) }
        },
    )
    .await
}

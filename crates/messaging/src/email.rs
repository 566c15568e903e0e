//! SMTP email delivery.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use serde::{Deserialize, Serialize};

use es_domain::config::EmailConfig;
use es_domain::error::{Error, Result};
use es_domain::trace::TraceEvent;

/// SMTPS (implicit TLS) port; anything else negotiates STARTTLS.
const IMPLICIT_TLS_PORT: u16 = 465;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Email {
    pub to: Vec<String>,
    pub subject: String,
    pub text: String,
    #[serde(default)]
    pub html: Option<String>,
}

/// Outbound email capability.  Returns the provider message id.
#[async_trait]
pub trait EmailTransport: Send + Sync {
    async fn send(&self, email: &Email) -> Result<String>;
}

fn mailbox(addr: &str) -> Result<Mailbox> {
    addr.trim()
        .parse::<Mailbox>()
        .map_err(|e| Error::Other(format!("invalid email address {addr:?}: {e}")))
}

/// Build the MIME message.
///
/// One recipient goes in `To`.  Several recipients are blind-copied with the
/// sender in `To`, so guardians never see each other's addresses.
pub fn build_message(from: &str, email: &Email) -> Result<Message> {
    if email.to.is_empty() {
        return Err(Error::Other("email has no recipients".into()));
    }
    let sender = mailbox(from)?;
    let mut builder = Message::builder()
        .from(sender.clone())
        .subject(email.subject.clone())
        .message_id(None);

    if let [single] = email.to.as_slice() {
        builder = builder.to(mailbox(single)?);
    } else {
        builder = builder.to(sender);
        for addr in &email.to {
            builder = builder.bcc(mailbox(addr)?);
        }
    }

    let built = match &email.html {
        Some(html) => builder.multipart(MultiPart::alternative_plain_html(
            email.text.clone(),
            html.clone(),
        )),
        None => builder
            .header(ContentType::TEXT_PLAIN)
            .body(email.text.clone()),
    };
    built.map_err(|e| Error::Other(format!("building email: {e}")))
}

fn message_id(message: &Message) -> String {
    message
        .headers()
        .get_raw("Message-ID")
        .map(str::to_owned)
        .unwrap_or_default()
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// SMTP mailer
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
}

impl SmtpMailer {
    /// Reads SMTP credentials from the configured env vars.
    pub fn from_config(cfg: &EmailConfig) -> Result<Self> {
        let user = std::env::var(&cfg.username_env)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| Error::Config(format!("{} is not set", cfg.username_env)))?;
        let pass = std::env::var(&cfg.password_env)
            .ok()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| Error::Config(format!("{} is not set", cfg.password_env)))?;

        let builder = if cfg.smtp_port == IMPLICIT_TLS_PORT {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&cfg.smtp_host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&cfg.smtp_host)
        }
        .map_err(|e| Error::Config(format!("smtp relay {}: {e}", cfg.smtp_host)))?;

        let transport = builder
            .port(cfg.smtp_port)
            .credentials(Credentials::new(user.clone(), pass))
            .build();

        Ok(Self {
            transport,
            from: cfg.from.clone().unwrap_or(user),
        })
    }
}

#[async_trait]
impl EmailTransport for SmtpMailer {
    async fn send(&self, email: &Email) -> Result<String> {
        let message = build_message(&self.from, email)?;
        let id = message_id(&message);
        let result = self.transport.send(message).await;

        TraceEvent::MessageSent {
            channel: "email".into(),
            kind: if email.to.len() > 1 { "bcc" } else { "direct" }.into(),
            ok: result.is_ok(),
        }
        .emit();

        result.map_err(|e| Error::Provider {
            provider: "smtp".into(),
            message: e.to_string(),
        })?;
        tracing::info!(recipients = email.to.len(), message_id = %id, "email sent");
        Ok(id)
    }
}

//! Outbound messaging for EduSync.
//!
//! [`MessagingChannel`] is the send capability the conversation dispatcher
//! and the batch engine talk to; [`whatsapp::WhatsAppCloudClient`] is the
//! production implementation.  Email goes through [`EmailTransport`].

pub mod channel;
pub mod email;
pub mod markup;
pub mod testing;
pub mod whatsapp;

pub use channel::{Choice, MessagingChannel, OutboundMessage, TemplateMessage};
pub use email::{Email, EmailTransport, SmtpMailer};
pub use markup::html_to_chat;
pub use whatsapp::WhatsAppCloudClient;

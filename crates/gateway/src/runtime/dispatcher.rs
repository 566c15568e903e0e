//! Conversation dispatcher.
//!
//! One inbound message is handled start to finish: resolve the sender's
//! students, settle which one the conversation is about, run the command's
//! reply flow.  Each conversation has at most one active student; selecting
//! another one replaces it.
//!
//! [`Dispatcher::handle`] never fails.  Errors inside a turn are logged and
//! the turn still counts as handled, so the webhook acknowledges the event
//! and the provider does not redeliver it.

use std::sync::Arc;
use std::time::Instant;

use es_directory::{DailyFeed, IdentityResolver};
use es_domain::config::{DispatchConfig, WhatsAppConfig};
use es_domain::error::Result;
use es_domain::phone;
use es_domain::trace::TraceEvent;
use es_domain::StudentRecord;
use es_messaging::{MessagingChannel, OutboundMessage};
use es_sessions::ConversationStore;

use super::command::Command;
use super::inbound::InboundMessage;
use super::replies;

/// How a turn ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The number matched no student.
    NoAccount,
    /// Several students and none active: the guardian was asked to pick.
    SelectionPrompted,
    /// A student was selected and the main menu sent.
    Selected,
    /// The selection payload named no student of this guardian.
    InvalidSelection,
    /// The command's reply flow ran.
    Replied,
    /// Something failed mid-turn; the reply may not have been sent.
    Failed,
}

impl Outcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::NoAccount => "no_account",
            Outcome::SelectionPrompted => "selection_prompted",
            Outcome::Selected => "selected",
            Outcome::InvalidSelection => "invalid_selection",
            Outcome::Replied => "replied",
            Outcome::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone)]
pub struct DispatcherSettings {
    pub country_code: String,
    pub frontend_url: String,
    pub support_email: String,
    pub mark_read: bool,
}

impl DispatcherSettings {
    pub fn from_config(whatsapp: &WhatsAppConfig, dispatch: &DispatchConfig) -> Self {
        Self {
            country_code: whatsapp.default_country_code.clone(),
            frontend_url: dispatch.frontend_url.clone(),
            support_email: dispatch.support_email.clone(),
            mark_read: whatsapp.mark_read,
        }
    }
}

pub struct Dispatcher {
    identity: Arc<IdentityResolver>,
    sessions: Arc<ConversationStore>,
    feed: Arc<DailyFeed>,
    channel: Arc<dyn MessagingChannel>,
    settings: DispatcherSettings,
}

/// Addressing for one turn.
struct Turn<'a> {
    /// Session key: the sender's normalized digits.
    conversation: &'a str,
    /// Reply address in provider format.
    to: &'a str,
}

impl Dispatcher {
    pub fn new(
        identity: Arc<IdentityResolver>,
        sessions: Arc<ConversationStore>,
        feed: Arc<DailyFeed>,
        channel: Arc<dyn MessagingChannel>,
        settings: DispatcherSettings,
    ) -> Self {
        Self {
            identity,
            sessions,
            feed,
            channel,
            settings,
        }
    }

    pub async fn handle(&self, msg: &InboundMessage) -> Outcome {
        let started = Instant::now();
        let conversation = phone::normalize(&msg.from);
        let to = phone::to_provider_format(&msg.from, &self.settings.country_code);
        let command = msg.command();

        if self.settings.mark_read {
            if let Some(id) = &msg.message_id {
                if let Err(e) = self.channel.mark_read(id).await {
                    tracing::debug!(message_id = %id, error = %e, "mark-read failed");
                }
            }
        }

        let turn = Turn {
            conversation: &conversation,
            to: &to,
        };
        let outcome = match self.run(&turn, &msg.from, &command).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(
                    phone = %conversation,
                    command = command.name(),
                    error = %e,
                    "conversation turn failed"
                );
                Outcome::Failed
            }
        };

        TraceEvent::CommandDispatched {
            conversation,
            command: command.name().into(),
            outcome: outcome.as_str().into(),
            duration_ms: started.elapsed().as_millis() as u64,
        }
        .emit();
        outcome
    }

    async fn run(&self, turn: &Turn<'_>, raw_from: &str, command: &Command) -> Result<Outcome> {
        let students = self.identity.find_students_by_identity(raw_from).await;
        if students.is_empty() {
            self.send(turn, replies::no_account()).await?;
            return Ok(Outcome::NoAccount);
        }

        match command {
            Command::Start => {
                if let [only] = students.as_slice() {
                    self.select(turn, only, true);
                    self.send(turn, replies::main_menu(only)).await?;
                    return Ok(Outcome::Selected);
                }
                self.send(turn, replies::selection_prompt(&students)).await?;
                return Ok(Outcome::SelectionPrompted);
            }
            Command::SelectStudent(student_id) => {
                return match students.iter().find(|s| &s.student_id == student_id) {
                    Some(student) => {
                        self.select(turn, student, false);
                        self.send(turn, replies::main_menu(student)).await?;
                        Ok(Outcome::Selected)
                    }
                    None => {
                        tracing::info!(
                            phone = %turn.conversation,
                            student_id = %student_id,
                            "selection names an unknown student"
                        );
                        self.send(turn, replies::invalid_selection()).await?;
                        Ok(Outcome::InvalidSelection)
                    }
                };
            }
            _ => {}
        }

        let Some(active) = self.active_student(turn, &students) else {
            self.send(turn, replies::selection_prompt(&students)).await?;
            return Ok(Outcome::SelectionPrompted);
        };

        let reply = match command {
            Command::Homework => self.homework(active).await?,
            Command::Updates => self.updates(active).await?,
            Command::AiTutorQuery => replies::tutor_promo(active, &self.settings.frontend_url),
            Command::Help => replies::help(&self.settings.support_email),
            Command::Unknown => replies::unknown(),
            Command::Unrecognized(_) | Command::Start | Command::SelectStudent(_) => {
                replies::unrecognized()
            }
        };
        self.send(turn, reply).await?;
        Ok(Outcome::Replied)
    }

    /// The session's student if it is still one of this guardian's, else
    /// the only student (persisted), else `None`.
    fn active_student<'s>(
        &self,
        turn: &Turn<'_>,
        students: &'s [StudentRecord],
    ) -> Option<&'s StudentRecord> {
        if let Some(id) = self.sessions.get(turn.conversation) {
            if let Some(student) = students.iter().find(|s| s.student_id == id) {
                return Some(student);
            }
        }
        match students {
            [only] => {
                self.select(turn, only, true);
                Some(only)
            }
            _ => None,
        }
    }

    fn select(&self, turn: &Turn<'_>, student: &StudentRecord, auto: bool) {
        self.sessions.set(turn.conversation, &student.student_id);
        TraceEvent::StudentSelected {
            conversation: turn.conversation.to_owned(),
            student_id: student.student_id.clone(),
            auto,
        }
        .emit();
    }

    async fn homework(&self, student: &StudentRecord) -> Result<OutboundMessage> {
        let items = self
            .feed
            .homework(&student.tenant_id, &student.class_grade, &student.section)
            .await?;
        let today = self.feed.today();
        let visible: Vec<_> = items
            .into_iter()
            .filter(|item| item.visible_to(&student.student_id))
            .filter(|item| self.feed.is_on(&item.date, today))
            .collect();
        Ok(replies::homework_digest(student, &visible, self.feed.timezone()))
    }

    async fn updates(&self, student: &StudentRecord) -> Result<OutboundMessage> {
        let today = self.feed.today();
        let todays: Vec<_> = self
            .feed
            .announcements(&student.tenant_id)
            .await?
            .into_iter()
            .filter(|a| self.feed.is_on(&a.date, today))
            .collect();
        Ok(replies::updates_digest(student, &todays, self.feed.timezone()))
    }

    async fn send(&self, turn: &Turn<'_>, message: OutboundMessage) -> Result<()> {
        message.send_via(self.channel.as_ref(), turn.to).await
    }
}

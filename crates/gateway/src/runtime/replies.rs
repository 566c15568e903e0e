//! Conversation reply builders.
//!
//! Pure functions from resolved data to [`OutboundMessage`] values; the
//! dispatcher decides which one to send.

use chrono_tz::Tz;

use es_directory::feed::local_date;
use es_directory::{Announcement, FeedItem};
use es_domain::StudentRecord;
use es_messaging::{html_to_chat, Choice, OutboundMessage};

use super::command::Command;

/// Most candidates offered in one selection prompt.
pub const MAX_SELECTION_CHOICES: usize = 3;
/// Student names are cut to this many characters on selection buttons.
const SELECTION_NAME_CHARS: usize = 15;
/// Most feed items rendered in one digest.
pub const MAX_DIGEST_ITEMS: usize = 5;

const SEPARATOR: &str = "-----------------------------";

pub fn no_account() -> OutboundMessage {
    OutboundMessage::text(
        "We could not find any student details associated with this number. \
         Please check with your school administrator.",
    )
}

pub fn invalid_selection() -> OutboundMessage {
    OutboundMessage::text("🚫 Invalid selection. Please try again.")
}

pub fn selection_prompt(students: &[StudentRecord]) -> OutboundMessage {
    let choices = students
        .iter()
        .take(MAX_SELECTION_CHOICES)
        .map(|s| {
            let name: String = s.student_name.chars().take(SELECTION_NAME_CHARS).collect();
            Choice::new(
                Command::SelectStudent(s.student_id.clone()).id(),
                format!("👤 {name}"),
            )
        })
        .collect();
    OutboundMessage::with_choices(
        "👥 *Multiple Profiles Found*\n\nWho would you like to view details for?",
        choices,
    )
}

pub fn main_menu(student: &StudentRecord) -> OutboundMessage {
    let body = format!(
        "👋 *Hi, {parent}*\n\n🏫 *{school}*\n🎓 Student: *{name}*\n📚 Class: {class}\n\nHow can I help you today?",
        parent = student.parent_name,
        school = student.tenant_name,
        name = student.student_name,
        class = student.class_label(),
    );
    OutboundMessage::with_choices(
        body,
        vec![
            Choice::new(Command::Homework.id(), "📝 Homework"),
            Choice::new(Command::Updates.id(), "🔔 Updates"),
            Choice::new(Command::Help.id(), "🤝 Help"),
        ],
    )
}

fn display_date(raw: &str, tz: Tz) -> String {
    local_date(raw, tz)
        .map(|d| d.format("%d/%m/%Y").to_string())
        .unwrap_or_else(|| raw.to_owned())
}

/// Homework digest.  `items` must already be filtered for this student.
pub fn homework_digest(student: &StudentRecord, items: &[FeedItem], tz: Tz) -> OutboundMessage {
    if items.is_empty() {
        return OutboundMessage::text(format!(
            "📝 *Homework ({})*\n🏫 {}\n\n🎉 No pending homework! Enjoy your day.",
            student.class_label(),
            student.tenant_name
        ));
    }

    let mut msg = format!(
        "📝 *Homework for {}*\n🏫 *{}*\n",
        student.student_name, student.tenant_name
    );
    for item in items.iter().take(MAX_DIGEST_ITEMS) {
        let subject = item.subject.as_deref().unwrap_or("General");
        msg.push_str(&format!("\n{SEPARATOR}\n📌 *{subject}*\n{}\n", html_to_chat(&item.body)));
        if let Some(notes) = item.notes.as_deref().map(html_to_chat).filter(|n| !n.is_empty()) {
            msg.push_str(&format!("\n💡 *Notes:* \n_{notes}_\n"));
        }
        msg.push_str(&format!("\n🗓 Due: {}", display_date(&item.date, tz)));
    }
    OutboundMessage::text(msg)
}

pub fn updates_digest(
    student: &StudentRecord,
    announcements: &[Announcement],
    tz: Tz,
) -> OutboundMessage {
    if announcements.is_empty() {
        return OutboundMessage::text(format!(
            "🔔 *School Updates*\n🏫 {}\n\nAll caught up! No new announcements.",
            student.tenant_name
        ));
    }

    let mut msg = format!("🔔 *Latest Updates*\n🏫 *{}*\n", student.tenant_name);
    for a in announcements.iter().take(MAX_DIGEST_ITEMS) {
        let title = a.title.as_deref().unwrap_or("Announcement");
        msg.push_str(&format!(
            "\n{SEPARATOR}\n📢 *{title}*\n\n{}\n\n🕒 {}",
            html_to_chat(&a.message),
            display_date(&a.date, tz)
        ));
    }
    OutboundMessage::text(msg)
}

pub fn tutor_promo(student: &StudentRecord, frontend_url: &str) -> OutboundMessage {
    OutboundMessage::UrlAction {
        body: format!(
            "🤖 *{} AI Tutor*\n\nHey! I see you have a question. Our AI Tutor is ready to help 24/7!\n\n\
             It knows your class syllabus and can explain any topic instantly. Give it a try!",
            student.tenant_name
        ),
        label: "Start Learning".into(),
        url: format!(
            "{}/ai-tutor/{}",
            frontend_url.trim_end_matches('/'),
            student.tenant_id
        ),
    }
}

pub fn help(support_email: &str) -> OutboundMessage {
    OutboundMessage::text(format!(
        "🤝 *Support*\n\nNeed assistance? Contact the school administration directly or email us at {support_email}."
    ))
}

pub fn unknown() -> OutboundMessage {
    OutboundMessage::with_choices(
        "🤖 missed that! I'm best at showing Homework, Updates, or connecting you to the AI Tutor. \
         Tap a button below to get back on track!",
        vec![
            Choice::new(Command::Start.id(), "🏠 Main Menu"),
            Choice::new(Command::Updates.id(), "🔔 Latest Updates"),
        ],
    )
}

pub fn unrecognized() -> OutboundMessage {
    OutboundMessage::with_choices(
        "🤷‍♂️ I didn't quite catch that. Try one of the options below:",
        vec![Choice::new(Command::Start.id(), "🏠 Home")],
    )
}

//! Inbound event classification.
//!
//! Every inbound chat event maps to exactly one [`Command`].  Button ids
//! are the wire form of commands (`HOMEWORK`, `SELECT_STUDENT:<id>`), so
//! [`Command::id`] and [`Command::from_reply_id`] are inverses for every
//! variant except `Unknown`.

use std::fmt;

/// Reserved button-id prefix carrying a student selection.
pub const SELECT_PREFIX: &str = "SELECT_STUDENT";

/// Exact (trimmed, lowercased) texts that restart the conversation.
const START_WORDS: &[&str] = &["hi", "hello", "start", "menu", "restart", "hey"];
/// Substrings that ask for the class feed.
const HOMEWORK_KEYWORDS: &[&str] = &["homework", "remark"];
/// Substrings that look like a study question.
const TUTOR_KEYWORDS: &[&str] = &["tutor", "ai", "study", "explain", "question", "doubt"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    SelectStudent(String),
    Homework,
    Updates,
    AiTutorQuery,
    Help,
    /// Free text that matched nothing.
    Unknown,
    /// A button id this build does not know.
    Unrecognized(String),
}

impl Command {
    /// Classify free text typed by the guardian.
    pub fn from_text(text: &str) -> Self {
        let text = text.trim().to_lowercase();
        if START_WORDS.contains(&text.as_str()) {
            Command::Start
        } else if HOMEWORK_KEYWORDS.iter().any(|k| text.contains(k)) {
            Command::Homework
        } else if TUTOR_KEYWORDS.iter().any(|k| text.contains(k)) {
            Command::AiTutorQuery
        } else {
            Command::Unknown
        }
    }

    /// Classify a quick-reply button id.
    pub fn from_reply_id(id: &str) -> Self {
        if let Some(payload) = id
            .strip_prefix(SELECT_PREFIX)
            .and_then(|rest| rest.strip_prefix(':'))
        {
            let student_id = payload.split(':').next().unwrap_or_default();
            return Command::SelectStudent(student_id.to_owned());
        }
        match id {
            "START" => Command::Start,
            "HOMEWORK" => Command::Homework,
            "UPDATES" => Command::Updates,
            "AI_TUTOR_QUERY" => Command::AiTutorQuery,
            "HELP" => Command::Help,
            "UNKNOWN" => Command::Unknown,
            other => Command::Unrecognized(other.to_owned()),
        }
    }

    /// Button id for this command.
    pub fn id(&self) -> String {
        match self {
            Command::Start => "START".into(),
            Command::SelectStudent(student_id) => format!("{SELECT_PREFIX}:{student_id}"),
            Command::Homework => "HOMEWORK".into(),
            Command::Updates => "UPDATES".into(),
            Command::AiTutorQuery => "AI_TUTOR_QUERY".into(),
            Command::Help => "HELP".into(),
            Command::Unknown => "UNKNOWN".into(),
            Command::Unrecognized(raw) => raw.clone(),
        }
    }

    /// Label used in logs and trace events (no payload).
    pub fn name(&self) -> &'static str {
        match self {
            Command::Start => "start",
            Command::SelectStudent(_) => "select_student",
            Command::Homework => "homework",
            Command::Updates => "updates",
            Command::AiTutorQuery => "ai_tutor_query",
            Command::Help => "help",
            Command::Unknown => "unknown",
            Command::Unrecognized(_) => "unrecognized",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id())
    }
}

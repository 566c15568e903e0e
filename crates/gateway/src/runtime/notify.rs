//! Typed notifications: one notification type plus data, rendered once and
//! broadcast through the batch engine.

use serde_json::{Map, Value};

use es_messaging::TemplateMessage;

use super::batch::MessageSpec;

/// Sends the provider's stock template instead of text.
pub const TEST_CONNECTION: &str = "TEST_CONNECTION";
const TEST_TEMPLATE: &str = "hello_world";

fn field(data: &Map<String, Value>, name: &str) -> String {
    data.get(name).map(value_text).unwrap_or_default()
}

fn value_text(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// `"BUS_DELAY"` → `"BUS DELAY"`.
fn headline(kind: &str) -> String {
    kind.replace('_', " ")
}

/// Render a notification type and its data into a broadcast.
pub fn render(kind: &str, data: &Map<String, Value>) -> MessageSpec {
    if kind == TEST_CONNECTION {
        return MessageSpec::Template(TemplateMessage::new(TEST_TEMPLATE));
    }

    let body = match kind {
        "HOLIDAY_ALERT" => format!(
            "🏫 *{}*\n📅 Date: {}\n\n{}",
            field(data, "schoolName"),
            field(data, "date"),
            field(data, "reason")
        ),
        "BUS_DELAY" => format!(
            "🚌 *BUS DELAY ALERT*\nRoute: {}\nDelay: {}",
            field(data, "route"),
            field(data, "minutes")
        ),
        "EMERGENCY_ALERT" => format!("🚨 *EMERGENCY*\n{}", field(data, "message")),
        _ => match data.get("updateMessage") {
            Some(msg) => value_text(msg),
            None => data
                .values()
                .map(value_text)
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join("\n"),
        },
    };

    MessageSpec::text(format!("🏫 *{}*\n\n{body}", headline(kind)))
}

/// Accept a single recipient or a list; drop blanks and duplicates while
/// keeping first-seen order.
pub fn collect_recipients(to: &Value) -> Vec<String> {
    let raw: Vec<String> = match to {
        Value::Array(items) => items.iter().map(value_text).collect(),
        Value::Null => Vec::new(),
        other => vec![value_text(other)],
    };
    let mut seen = std::collections::HashSet::new();
    raw.into_iter()
        .map(|s| s.trim().to_owned())
        .filter(|s| !s.is_empty())
        .filter(|s| seen.insert(s.clone()))
        .collect()
}

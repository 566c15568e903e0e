//! Conversation → active student map.
//!
//! Each conversation (keyed by the guardian's normalized phone) holds at
//! most one active student.  `set` always replaces; there is no merge.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Conversation entry
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationEntry {
    pub conversation_key: String,
    pub active_student_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Conversation store
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Bounded in-process conversation store.
///
/// Inserting a new conversation at capacity evicts the least recently
/// updated one.
pub struct ConversationStore {
    entries: RwLock<HashMap<String, ConversationEntry>>,
    max_entries: usize,
}

impl ConversationStore {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            max_entries: max_entries.max(1),
        }
    }

    /// Active student for a conversation.
    pub fn get(&self, conversation_key: &str) -> Option<String> {
        self.entries
            .read()
            .get(conversation_key)
            .map(|e| e.active_student_id.clone())
    }

    #[cfg(test)]
    fn entry(&self, conversation_key: &str) -> Option<ConversationEntry> {
        self.entries.read().get(conversation_key).cloned()
    }

    /// Make `student_id` the active student, replacing any previous one.
    pub fn set(&self, conversation_key: &str, student_id: &str) {
        self.set_at(conversation_key, student_id, Utc::now());
    }

    pub(crate) fn set_at(&self, conversation_key: &str, student_id: &str, now: DateTime<Utc>) {
        let mut entries = self.entries.write();

        if let Some(entry) = entries.get_mut(conversation_key) {
            entry.active_student_id = student_id.to_owned();
            entry.updated_at = now;
            return;
        }

        if entries.len() >= self.max_entries {
            let oldest = entries
                .values()
                .min_by_key(|e| e.updated_at)
                .map(|e| e.conversation_key.clone());
            if let Some(key) = oldest {
                entries.remove(&key);
                tracing::debug!(conversation = %key, "session evicted at capacity");
            }
        }

        entries.insert(
            conversation_key.to_owned(),
            ConversationEntry {
                conversation_key: conversation_key.to_owned(),
                active_student_id: student_id.to_owned(),
                created_at: now,
                updated_at: now,
            },
        );
    }

    /// Forget the selection.  Returns whether one existed.
    pub fn clear(&self, conversation_key: &str) -> bool {
        self.entries.write().remove(conversation_key).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop conversations not updated within `idle`.  Returns how many were
    /// removed.
    pub fn prune_idle(&self, idle: Duration) -> usize {
        self.prune_idle_at(idle, Utc::now())
    }

    pub fn prune_idle_at(&self, idle: Duration, now: DateTime<Utc>) -> usize {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, e| now.signed_duration_since(e.updated_at) < idle);
        before - entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_write_wins() {
        let store = ConversationStore::new(10);
        store.set("919876543210", "a");
        store.set("919876543210", "b");
        assert_eq!(store.get("919876543210").as_deref(), Some("b"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn clear_forgets_selection() {
        let store = ConversationStore::new(10);
        store.set("k", "a");
        assert!(store.clear("k"));
        assert!(!store.clear("k"));
        assert_eq!(store.get("k"), None);
    }

    #[test]
    fn reselect_keeps_created_at() {
        let store = ConversationStore::new(10);
        let t0 = Utc::now();
        store.set_at("k", "a", t0);
        store.set_at("k", "b", t0 + Duration::minutes(5));
        let entry = store.entry("k").unwrap();
        assert_eq!(entry.created_at, t0);
        assert_eq!(entry.updated_at, t0 + Duration::minutes(5));
    }

    #[test]
    fn capacity_evicts_least_recently_updated() {
        let store = ConversationStore::new(2);
        let t0 = Utc::now();
        store.set_at("old", "a", t0);
        store.set_at("mid", "b", t0 + Duration::seconds(1));
        // Refresh "old" so "mid" becomes the eviction candidate.
        store.set_at("old", "a2", t0 + Duration::seconds(2));
        store.set_at("new", "c", t0 + Duration::seconds(3));

        assert_eq!(store.len(), 2);
        assert_eq!(store.get("mid"), None);
        assert_eq!(store.get("old").as_deref(), Some("a2"));
        assert_eq!(store.get("new").as_deref(), Some("c"));
    }

    #[test]
    fn prune_drops_only_idle_conversations() {
        let store = ConversationStore::new(10);
        let t0 = Utc::now();
        store.set_at("stale", "a", t0);
        store.set_at("fresh", "b", t0 + Duration::hours(2));

        let removed = store.prune_idle_at(Duration::hours(1), t0 + Duration::hours(2));
        assert_eq!(removed, 1);
        assert_eq!(store.get("stale"), None);
        assert!(store.get("fresh").is_some());
    }
}

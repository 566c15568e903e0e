use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Conversation sessions
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Bounds for the in-process conversation → active-student map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionsConfig {
    /// Maximum tracked conversations.  Inserting past the bound evicts the
    /// least recently updated conversation.
    #[serde(default = "d_max_entries")]
    pub max_entries: usize,
    /// Conversations idle for longer than this are dropped by the pruner.
    /// `None` disables idle pruning.
    #[serde(default = "d_idle_timeout")]
    pub idle_timeout_secs: Option<u64>,
    /// How often the background pruner runs.
    #[serde(default = "d_prune_interval")]
    pub prune_interval_secs: u64,
}

impl Default for SessionsConfig {
    fn default() -> Self {
        Self {
            max_entries: d_max_entries(),
            idle_timeout_secs: d_idle_timeout(),
            prune_interval_secs: d_prune_interval(),
        }
    }
}

fn d_max_entries() -> usize {
    100_000
}
fn d_idle_timeout() -> Option<u64> {
    Some(7 * 24 * 3600)
}
fn d_prune_interval() -> u64 {
    600
}

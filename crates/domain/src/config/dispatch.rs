use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Conversation replies & batch pacing
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Recipients per batch chunk (also the peak number of concurrent sends).
    #[serde(default = "d_chunk_size")]
    pub chunk_size: usize,
    /// Pause between chunks, measured from the previous chunk settling.
    #[serde(default = "d_inter_chunk_delay")]
    pub inter_chunk_delay_ms: u64,
    /// Base URL of the parent-facing web app (tutor deep links).
    #[serde(default = "d_frontend_url")]
    pub frontend_url: String,
    #[serde(default = "d_support_email")]
    pub support_email: String,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            chunk_size: d_chunk_size(),
            inter_chunk_delay_ms: d_inter_chunk_delay(),
            frontend_url: d_frontend_url(),
            support_email: d_support_email(),
        }
    }
}

fn d_chunk_size() -> usize {
    50
}
fn d_inter_chunk_delay() -> u64 {
    1000
}
fn d_frontend_url() -> String {
    "https://edusync.vercel.app".into()
}
fn d_support_email() -> String {
    "support@edusync.com".into()
}

use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// AI tutor (generative answers)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TutorConfig {
    #[serde(default = "d_api_base")]
    pub api_base: String,
    #[serde(default = "d_model")]
    pub model: String,
    #[serde(default = "d_api_key_env")]
    pub api_key_env: String,
    /// Sliding TTL for cached answers; every hit resets it.
    #[serde(default = "d_cache_ttl")]
    pub cache_ttl_secs: u64,
    #[serde(default = "d_timeout_secs")]
    pub timeout_secs: u64,
    /// Overrides the built-in system prompt when set.
    #[serde(default)]
    pub system_prompt: Option<String>,
}

impl Default for TutorConfig {
    fn default() -> Self {
        Self {
            api_base: d_api_base(),
            model: d_model(),
            api_key_env: d_api_key_env(),
            cache_ttl_secs: d_cache_ttl(),
            timeout_secs: d_timeout_secs(),
            system_prompt: None,
        }
    }
}

fn d_api_base() -> String {
    "https://generativelanguage.googleapis.com".into()
}
fn d_model() -> String {
    "gemini-2.0-flash".into()
}
fn d_api_key_env() -> String {
    "GEMINI_API_KEY".into()
}
fn d_cache_ttl() -> u64 {
    15 * 24 * 3600
}
fn d_timeout_secs() -> u64 {
    60
}

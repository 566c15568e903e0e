use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Cache-aside tiers
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Selects and sizes the cache tier.
///
/// Exactly one tier is active per process: the shared Redis tier when the
/// env var named by `redis_url_env` is set and non-empty, otherwise the
/// in-process tier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Environment variable holding the Redis connection URL.
    #[serde(default = "d_redis_url_env")]
    pub redis_url_env: String,
    /// Upper bound on live entries in the in-process tier.
    #[serde(default = "d_memory_max_entries")]
    pub memory_max_entries: usize,
    /// TTL used when a caller does not pick one.
    #[serde(default = "d_default_ttl")]
    pub default_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            redis_url_env: d_redis_url_env(),
            memory_max_entries: d_memory_max_entries(),
            default_ttl_secs: d_default_ttl(),
        }
    }
}

fn d_redis_url_env() -> String {
    "REDIS_URL".into()
}
fn d_memory_max_entries() -> usize {
    50_000
}
fn d_default_ttl() -> u64 {
    300
}

//! Cache-aside layer.
//!
//! One [`CacheTier`] is chosen per process: the shared Redis tier when a
//! connection URL is configured, otherwise the in-process [`MemoryTier`].
//! [`CacheAside`] wraps the chosen tier with get-or-compute semantics.  Tier
//! failures are logged and swallowed; caching never decides correctness.

pub mod aside;
pub mod memory;
#[cfg(feature = "redis-tier")]
pub mod redis_tier;
pub mod tier;

use std::sync::Arc;

use es_domain::config::CacheConfig;

pub use aside::{CacheAside, CachePolicy};
pub use memory::MemoryTier;
pub use tier::CacheTier;

/// Build the cache for this process from config.
///
/// A configured but unreachable Redis falls back to the in-process tier
/// rather than failing startup.
pub async fn from_config(cfg: &CacheConfig) -> CacheAside {
    let redis_url = std::env::var(&cfg.redis_url_env)
        .ok()
        .filter(|v| !v.trim().is_empty());

    #[cfg(feature = "redis-tier")]
    if let Some(url) = redis_url {
        match redis_tier::RedisTier::connect(&url).await {
            Ok(tier) => {
                tracing::info!("cache: redis tier active");
                return CacheAside::new(Arc::new(tier));
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    env = %cfg.redis_url_env,
                    "cache: redis unreachable, falling back to in-process tier"
                );
            }
        }
    }

    #[cfg(not(feature = "redis-tier"))]
    if redis_url.is_some() {
        tracing::warn!(
            env = %cfg.redis_url_env,
            "cache: redis URL set but built without the redis-tier feature"
        );
    }

    tracing::info!(
        max_entries = cfg.memory_max_entries,
        "cache: in-process tier active (not shared across processes)"
    );
    CacheAside::new(Arc::new(MemoryTier::new(cfg.memory_max_entries)))
}

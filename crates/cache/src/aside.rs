use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;

use es_domain::trace::TraceEvent;

use crate::tier::CacheTier;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Policy
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Expiry policy for one cached lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    pub ttl: Duration,
    /// Reset the TTL to the full window on every hit.
    pub sliding: bool,
}

impl CachePolicy {
    pub fn fixed_secs(secs: u64) -> Self {
        Self {
            ttl: Duration::from_secs(secs),
            sliding: false,
        }
    }

    pub fn sliding_secs(secs: u64) -> Self {
        Self {
            ttl: Duration::from_secs(secs),
            sliding: true,
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// CacheAside
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Get-or-compute over a single active [`CacheTier`].
///
/// Cheap to clone; clones share the tier.
#[derive(Clone)]
pub struct CacheAside {
    tier: Arc<dyn CacheTier>,
}

impl CacheAside {
    pub fn new(tier: Arc<dyn CacheTier>) -> Self {
        Self { tier }
    }

    pub fn tier_name(&self) -> &'static str {
        self.tier.name()
    }

    /// Return the cached value for `key`, or run `compute` and store its
    /// result.
    ///
    /// A compute error is returned as-is and nothing is stored.  A result that
    /// serializes to JSON `null` is returned but not stored.
    pub async fn get_or_compute<T, E, F, Fut>(
        &self,
        key: &str,
        policy: CachePolicy,
        compute: F,
    ) -> std::result::Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
    {
        if let Some(value) = self.lookup(key, policy).await {
            return Ok(value);
        }

        let value = compute().await?;
        self.store(key, &value, policy.ttl).await;
        Ok(value)
    }

    /// Read a cached value without computing or refreshing anything.
    pub async fn peek<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.tier.get(key).await {
            Ok(Some(raw)) => serde_json::from_str(&raw).ok(),
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(key, tier = self.tier.name(), error = %e, "cache read failed");
                None
            }
        }
    }

    /// Remove `key` from the active tier.  Missing keys are fine.
    pub async fn invalidate(&self, key: &str) {
        match self.tier.delete(key).await {
            Ok(()) => TraceEvent::CacheInvalidated {
                key: key.to_owned(),
                tier: self.tier.name().into(),
            }
            .emit(),
            Err(e) => {
                tracing::warn!(key, tier = self.tier.name(), error = %e, "cache invalidate failed");
            }
        }
    }

    /// Remaining TTL for `key`, if the tier reports one.
    #[cfg(test)]
    async fn ttl(&self, key: &str) -> Option<Duration> {
        self.tier.ttl(key).await.ok().flatten()
    }

    async fn lookup<T: DeserializeOwned>(&self, key: &str, policy: CachePolicy) -> Option<T> {
        let tier = self.tier.name();
        let raw = match self.tier.get(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                TraceEvent::CacheMiss {
                    key: key.to_owned(),
                    tier: tier.into(),
                }
                .emit();
                return None;
            }
            Err(e) => {
                tracing::warn!(key, tier, error = %e, "cache read failed, computing");
                return None;
            }
        };

        let value = match serde_json::from_str(&raw) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(key, tier, error = %e, "cached value undecodable, recomputing");
                return None;
            }
        };

        if policy.sliding {
            if let Err(e) = self.tier.expire(key, policy.ttl).await {
                tracing::warn!(key, tier, error = %e, "sliding refresh failed");
            }
        }

        TraceEvent::CacheHit {
            key: key.to_owned(),
            tier: tier.into(),
            sliding: policy.sliding,
        }
        .emit();
        Some(value)
    }

    async fn store<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) {
        let tier = self.tier.name();
        let raw = match serde_json::to_string(value) {
            Ok(raw) if raw != "null" => raw,
            Ok(_) => return,
            Err(e) => {
                tracing::warn!(key, tier, error = %e, "value not serializable, skipping cache");
                return;
            }
        };
        match self.tier.set(key, raw, ttl).await {
            Ok(()) => TraceEvent::CacheStored {
                key: key.to_owned(),
                tier: tier.into(),
                ttl_secs: ttl.as_secs(),
            }
            .emit(),
            Err(e) => tracing::warn!(key, tier, error = %e, "cache write failed"),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryTier;
    use async_trait::async_trait;
    use es_domain::error::{Error, Result};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn memory() -> CacheAside {
        CacheAside::new(Arc::new(MemoryTier::new(100)))
    }

    struct FailingTier;

    #[async_trait]
    impl CacheTier for FailingTier {
        fn name(&self) -> &'static str {
            "failing"
        }
        async fn get(&self, _key: &str) -> Result<Option<String>> {
            Err(Error::Cache("down".into()))
        }
        async fn set(&self, _key: &str, _value: String, _ttl: Duration) -> Result<()> {
            Err(Error::Cache("down".into()))
        }
        async fn expire(&self, _key: &str, _ttl: Duration) -> Result<bool> {
            Err(Error::Cache("down".into()))
        }
        async fn delete(&self, _key: &str) -> Result<()> {
            Err(Error::Cache("down".into()))
        }
        async fn ttl(&self, _key: &str) -> Result<Option<Duration>> {
            Err(Error::Cache("down".into()))
        }
    }

    #[tokio::test]
    async fn miss_computes_then_hit_skips_compute() {
        let cache = memory();
        let calls = AtomicUsize::new(0);
        let compute = || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, Error>(vec!["a".to_string()])
        };

        let first = cache
            .get_or_compute("k", CachePolicy::fixed_secs(60), compute)
            .await
            .unwrap();
        let second: Vec<String> = cache
            .get_or_compute("k", CachePolicy::fixed_secs(60), || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, Error>(vec![])
            })
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn sliding_hit_resets_full_window() {
        let cache = memory();
        let policy = CachePolicy::sliding_secs(100);
        cache
            .get_or_compute("k", policy, || async { Ok::<_, Error>(1u32) })
            .await
            .unwrap();

        tokio::time::advance(Duration::from_secs(60)).await;
        cache
            .get_or_compute("k", policy, || async { Ok::<_, Error>(2u32) })
            .await
            .unwrap();

        assert_eq!(cache.ttl("k").await, Some(Duration::from_secs(100)));
    }

    #[tokio::test(start_paused = true)]
    async fn fixed_hit_leaves_expiry_untouched() {
        let cache = memory();
        let policy = CachePolicy::fixed_secs(100);
        cache
            .get_or_compute("k", policy, || async { Ok::<_, Error>(1u32) })
            .await
            .unwrap();

        tokio::time::advance(Duration::from_secs(60)).await;
        let v = cache
            .get_or_compute("k", policy, || async { Ok::<_, Error>(2u32) })
            .await
            .unwrap();

        assert_eq!(v, 1);
        assert_eq!(cache.ttl("k").await, Some(Duration::from_secs(40)));
    }

    #[tokio::test(start_paused = true)]
    async fn expired_entry_is_recomputed() {
        let cache = memory();
        let policy = CachePolicy::fixed_secs(10);
        cache
            .get_or_compute("k", policy, || async { Ok::<_, Error>(1u32) })
            .await
            .unwrap();
        tokio::time::advance(Duration::from_secs(11)).await;
        let v = cache
            .get_or_compute("k", policy, || async { Ok::<_, Error>(2u32) })
            .await
            .unwrap();
        assert_eq!(v, 2);
    }

    #[tokio::test]
    async fn null_result_is_not_stored() {
        let cache = memory();
        let v: Option<String> = cache
            .get_or_compute("k", CachePolicy::fixed_secs(60), || async {
                Ok::<_, Error>(None)
            })
            .await
            .unwrap();
        assert!(v.is_none());
        assert!(cache.peek::<Option<String>>("k").await.is_none());
        assert_eq!(cache.ttl("k").await, None);
    }

    #[tokio::test]
    async fn compute_error_is_propagated_and_not_cached() {
        let cache = memory();
        let err = cache
            .get_or_compute::<u32, _, _, _>("k", CachePolicy::fixed_secs(60), || async {
                Err(Error::Store("boom".into()))
            })
            .await;
        assert!(err.is_err());

        let v = cache
            .get_or_compute("k", CachePolicy::fixed_secs(60), || async { Ok::<_, Error>(7u32) })
            .await
            .unwrap();
        assert_eq!(v, 7);
    }

    #[tokio::test]
    async fn tier_failure_falls_through_to_compute() {
        let cache = CacheAside::new(Arc::new(FailingTier));
        let calls = AtomicUsize::new(0);
        for _ in 0..2 {
            let v = cache
                .get_or_compute("k", CachePolicy::sliding_secs(60), || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, Error>("fresh".to_string())
                })
                .await
                .unwrap();
            assert_eq!(v, "fresh");
        }
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        cache.invalidate("k").await;
    }

    #[tokio::test]
    async fn invalidate_forces_recompute_and_tolerates_missing_key() {
        let cache = memory();
        let policy = CachePolicy::fixed_secs(60);
        cache
            .get_or_compute("k", policy, || async { Ok::<_, Error>(1u32) })
            .await
            .unwrap();
        cache.invalidate("k").await;
        cache.invalidate("never-set").await;

        let v = cache
            .get_or_compute("k", policy, || async { Ok::<_, Error>(2u32) })
            .await
            .unwrap();
        assert_eq!(v, 2);
    }

    #[tokio::test]
    async fn undecodable_entry_counts_as_miss() {
        let tier = Arc::new(MemoryTier::new(10));
        tier.set("k", "not json".into(), Duration::from_secs(60))
            .await
            .unwrap();
        let cache = CacheAside::new(tier);
        let v = cache
            .get_or_compute("k", CachePolicy::fixed_secs(60), || async { Ok::<_, Error>(3u32) })
            .await
            .unwrap();
        assert_eq!(v, 3);
        assert_eq!(cache.peek::<u32>("k").await, Some(3));
    }
}

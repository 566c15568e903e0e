//! In-process tier.
//!
//! Not shared across processes.  Expiry uses `tokio::time::Instant`, so tests
//! can drive it with a paused clock.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::time::Instant;

use es_domain::error::Result;

use crate::tier::CacheTier;

struct Entry {
    value: String,
    expires_at: Instant,
}

/// Bounded map with per-entry expiry.
///
/// When full, expired entries are purged first; if that frees nothing, the
/// entry closest to expiry is evicted.
pub struct MemoryTier {
    entries: Mutex<HashMap<String, Entry>>,
    max_entries: usize,
}

impl MemoryTier {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            max_entries,
        }
    }

    /// Number of entries currently held, including not-yet-purged expired ones.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn make_room(entries: &mut HashMap<String, Entry>, max_entries: usize, now: Instant) {
        if entries.len() < max_entries {
            return;
        }
        entries.retain(|_, e| e.expires_at > now);
        while entries.len() >= max_entries {
            let victim = entries
                .iter()
                .min_by_key(|(_, e)| e.expires_at)
                .map(|(k, _)| k.clone());
            match victim {
                Some(k) => {
                    entries.remove(&k);
                }
                None => break,
            }
        }
    }
}

#[async_trait]
impl CacheTier for MemoryTier {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        match entries.get(key) {
            Some(e) if e.expires_at > now => Ok(Some(e.value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<()> {
        if self.max_entries == 0 {
            return Ok(());
        }
        let now = Instant::now();
        let mut entries = self.entries.lock();
        if !entries.contains_key(key) {
            Self::make_room(&mut entries, self.max_entries, now);
        }
        entries.insert(
            key.to_owned(),
            Entry {
                value,
                expires_at: now + ttl,
            },
        );
        Ok(())
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool> {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        match entries.get_mut(key) {
            Some(e) if e.expires_at > now => {
                e.expires_at = now + ttl;
                Ok(true)
            }
            Some(_) => {
                entries.remove(key);
                Ok(false)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.entries.lock().remove(key);
        Ok(())
    }

    async fn ttl(&self, key: &str) -> Result<Option<Duration>> {
        let now = Instant::now();
        Ok(self
            .entries
            .lock()
            .get(key)
            .filter(|e| e.expires_at > now)
            .map(|e| e.expires_at - now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn entry_expires_after_ttl() {
        let tier = MemoryTier::new(10);
        tier.set("k", "v".into(), Duration::from_secs(5)).await.unwrap();
        assert_eq!(tier.get("k").await.unwrap().as_deref(), Some("v"));

        tokio::time::advance(Duration::from_secs(6)).await;
        assert_eq!(tier.get("k").await.unwrap(), None);
        assert!(tier.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn expire_resets_remaining_ttl() {
        let tier = MemoryTier::new(10);
        tier.set("k", "v".into(), Duration::from_secs(10)).await.unwrap();
        tokio::time::advance(Duration::from_secs(7)).await;

        assert!(tier.expire("k", Duration::from_secs(10)).await.unwrap());
        assert_eq!(tier.ttl("k").await.unwrap(), Some(Duration::from_secs(10)));
        assert!(!tier.expire("missing", Duration::from_secs(10)).await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn full_tier_evicts_soonest_expiring() {
        let tier = MemoryTier::new(2);
        tier.set("short", "1".into(), Duration::from_secs(5)).await.unwrap();
        tier.set("long", "2".into(), Duration::from_secs(50)).await.unwrap();
        tier.set("new", "3".into(), Duration::from_secs(20)).await.unwrap();

        assert_eq!(tier.len(), 2);
        assert_eq!(tier.get("short").await.unwrap(), None);
        assert!(tier.get("long").await.unwrap().is_some());
        assert!(tier.get("new").await.unwrap().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn full_tier_prefers_purging_expired() {
        let tier = MemoryTier::new(2);
        tier.set("a", "1".into(), Duration::from_secs(1)).await.unwrap();
        tier.set("b", "2".into(), Duration::from_secs(100)).await.unwrap();
        tokio::time::advance(Duration::from_secs(2)).await;

        tier.set("c", "3".into(), Duration::from_secs(10)).await.unwrap();
        assert!(tier.get("b").await.unwrap().is_some());
        assert!(tier.get("c").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn overwrite_replaces_whole_entry() {
        let tier = MemoryTier::new(1);
        tier.set("k", "old".into(), Duration::from_secs(5)).await.unwrap();
        tier.set("k", "new".into(), Duration::from_secs(5)).await.unwrap();
        assert_eq!(tier.get("k").await.unwrap().as_deref(), Some("new"));
        assert_eq!(tier.len(), 1);
    }

    #[tokio::test]
    async fn zero_capacity_stores_nothing() {
        let tier = MemoryTier::new(0);
        tier.set("k", "v".into(), Duration::from_secs(5)).await.unwrap();
        assert_eq!(tier.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn delete_missing_key_is_noop() {
        let tier = MemoryTier::new(4);
        tier.delete("nope").await.unwrap();
    }
}

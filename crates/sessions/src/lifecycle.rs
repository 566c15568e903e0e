//! Session lifecycle: periodic idle pruning.

use std::sync::Arc;
use std::time::Duration;

use es_domain::config::SessionsConfig;
use tokio::task::JoinHandle;

use crate::store::ConversationStore;

/// When a conversation counts as idle, and how often to look.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdlePolicy {
    /// `None` disables pruning.
    pub idle_timeout: Option<Duration>,
    pub interval: Duration,
}

impl IdlePolicy {
    pub fn from_config(cfg: &SessionsConfig) -> Self {
        Self {
            idle_timeout: cfg.idle_timeout_secs.map(Duration::from_secs),
            interval: Duration::from_secs(cfg.prune_interval_secs.max(1)),
        }
    }

    /// Run one pruning pass.  Returns the number of conversations removed.
    pub fn prune(&self, store: &ConversationStore) -> usize {
        let Some(idle) = self.idle_timeout else {
            return 0;
        };
        let idle = chrono::Duration::from_std(idle).unwrap_or(chrono::Duration::MAX);
        store.prune_idle(idle)
    }
}

/// Spawn the background pruner.  Returns `None` when pruning is disabled.
pub fn spawn_pruner(store: Arc<ConversationStore>, policy: IdlePolicy) -> Option<JoinHandle<()>> {
    policy.idle_timeout?;
    Some(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(policy.interval);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let removed = policy.prune(&store);
            if removed > 0 {
                tracing::info!(removed, remaining = store.len(), "idle sessions pruned");
            }
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_policy_prunes_nothing() {
        let store = ConversationStore::new(10);
        store.set("k", "a");
        let policy = IdlePolicy {
            idle_timeout: None,
            interval: Duration::from_secs(1),
        };
        assert_eq!(policy.prune(&store), 0);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn zero_timeout_prunes_everything() {
        let store = ConversationStore::new(10);
        store.set("k", "a");
        let policy = IdlePolicy {
            idle_timeout: Some(Duration::ZERO),
            interval: Duration::from_secs(1),
        };
        assert_eq!(policy.prune(&store), 1);
    }

    #[test]
    fn config_maps_to_policy() {
        let policy = IdlePolicy::from_config(&SessionsConfig::default());
        assert_eq!(policy.idle_timeout, Some(Duration::from_secs(7 * 24 * 3600)));
        assert_eq!(policy.interval, Duration::from_secs(600));
    }

    #[tokio::test]
    async fn spawn_is_skipped_when_disabled() {
        let store = Arc::new(ConversationStore::new(10));
        let policy = IdlePolicy {
            idle_timeout: None,
            interval: Duration::from_secs(1),
        };
        assert!(spawn_pruner(store, policy).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn pruner_runs_on_interval() {
        let store = Arc::new(ConversationStore::new(10));
        store.set("k", "a");
        let policy = IdlePolicy {
            idle_timeout: Some(Duration::ZERO),
            interval: Duration::from_secs(60),
        };
        let handle = spawn_pruner(store.clone(), policy).unwrap();

        tokio::time::sleep(Duration::from_secs(61)).await;
        assert!(store.is_empty());
        handle.abort();
    }
}

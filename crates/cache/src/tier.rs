use std::time::Duration;

use async_trait::async_trait;
use es_domain::error::Result;

/// A key/value backend for the cache-aside layer.
///
/// Values are opaque serialized strings.  Every operation acts on a whole
/// entry; there are no partial updates.
#[async_trait]
pub trait CacheTier: Send + Sync {
    /// Short label used in logs and trace events (`"redis"`, `"memory"`).
    fn name(&self) -> &'static str;

    /// Read a live entry.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write an entry, replacing any previous value and expiry.
    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<()>;

    /// Reset the expiry of a live entry to `ttl` from now.  Returns `false`
    /// when the key does not exist.
    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool>;

    /// Remove an entry.  Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<()>;

    /// Remaining time-to-live of a live entry.
    async fn ttl(&self, key: &str) -> Result<Option<Duration>>;
}

//! Shared Redis tier.
//!
//! Uses a `ConnectionManager`, which reconnects transparently; a dropped
//! connection surfaces as an ordinary error on the next call.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

use es_domain::error::{Error, Result};

use crate::tier::CacheTier;

pub struct RedisTier {
    conn: ConnectionManager,
}

impl RedisTier {
    /// Open a managed connection to `url` (`redis://…` or `rediss://…`).
    pub async fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url).map_err(from_redis)?;
        let conn = ConnectionManager::new(client).await.map_err(from_redis)?;
        Ok(Self { conn })
    }
}

fn from_redis(e: redis::RedisError) -> Error {
    if e.is_timeout() {
        Error::Timeout(e.to_string())
    } else {
        Error::Cache(e.to_string())
    }
}

/// Redis rejects a zero expiry, so round sub-second TTLs up.
fn ttl_secs(ttl: Duration) -> u64 {
    ttl.as_secs().max(1)
}

#[async_trait]
impl CacheTier for RedisTier {
    fn name(&self) -> &'static str {
        "redis"
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.conn.clone();
        conn.get::<_, Option<String>>(key).await.map_err(from_redis)
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<()> {
        let mut conn = self.conn.clone();
        conn.set_ex::<_, _, ()>(key, value, ttl_secs(ttl))
            .await
            .map_err(from_redis)
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool> {
        let mut conn = self.conn.clone();
        conn.expire::<_, bool>(key, ttl_secs(ttl) as i64)
            .await
            .map_err(from_redis)
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(key).await.map_err(from_redis)
    }

    async fn ttl(&self, key: &str) -> Result<Option<Duration>> {
        let mut conn = self.conn.clone();
        let secs: i64 = conn.ttl(key).await.map_err(from_redis)?;
        // -2: missing, -1: no expiry.
        Ok((secs >= 0).then(|| Duration::from_secs(secs as u64)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sub_second_ttl_rounds_up() {
        assert_eq!(ttl_secs(Duration::from_millis(10)), 1);
        assert_eq!(ttl_secs(Duration::from_secs(600)), 600);
    }

    #[test]
    fn malformed_url_is_rejected() {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let res = rt.block_on(RedisTier::connect("not a url"));
        assert!(matches!(res, Err(Error::Cache(_))));
    }
}

use std::future::Future;
use std::time::Duration;

use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tokio::sync::OnceCell;

use crate::{CacheError, ResultCache};

/// Key probed by the health check. Never written.
const HEALTH_KEY: &str = "coderun:health";

/// Redis-backed cache sharing one multiplexed, auto-reconnecting connection.
pub struct RedisCache {
    client: redis::Client,
    conn: OnceCell<ConnectionManager>,
    op_timeout: Duration,
}

impl RedisCache {
    /// Validate the URL. The connection is opened on first use.
    pub fn open(url: &str, op_timeout: Duration) -> Result<Self, CacheError> {
        Ok(Self {
            client: redis::Client::open(url)?,
            conn: OnceCell::new(),
            op_timeout,
        })
    }

    async fn connection(&self) -> Result<ConnectionManager, CacheError> {
        let conn = self
            .conn
            .get_or_try_init(|| async {
                let manager = self.client.get_connection_manager().await?;
                tracing::info!("Redis connection established");
                Ok::<_, CacheError>(manager)
            })
            .await?;
        Ok(conn.clone())
    }

    /// Run one operation, connection setup included, under the op deadline.
    async fn bounded<T, F>(&self, op: &'static str, fut: F) -> Result<T, CacheError>
    where
        F: Future<Output = Result<T, CacheError>>,
    {
        tokio::time::timeout(self.op_timeout, fut)
            .await
            .map_err(|_| CacheError::Timeout {
                op,
                after: self.op_timeout,
            })?
    }
}

#[async_trait::async_trait]
impl ResultCache for RedisCache {
    fn backend(&self) -> &'static str {
        "redis"
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        self.bounded("get", async {
            let mut conn = self.connection().await?;
            let value: Option<String> = conn.get(key).await?;
            Ok(value)
        })
        .await
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        // SETEX rejects a zero expiry.
        let seconds = ttl.as_secs().max(1);
        self.bounded("set", async {
            let mut conn = self.connection().await?;
            let _: () = conn.set_ex(key, value, seconds).await?;
            Ok(())
        })
        .await
    }

    async fn health_check(&self) -> Result<(), CacheError> {
        self.bounded("health_check", async {
            let mut conn = self.connection().await?;
            let _: bool = conn.exists(HEALTH_KEY).await?;
            Ok(())
        })
        .await
    }
}

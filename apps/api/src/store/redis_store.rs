use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tokio::sync::OnceCell;

use crate::store::{ResultStore, StoreError};

/// Upper bound for one store operation, connecting included.
pub const REDIS_OP_TIMEOUT: Duration = Duration::from_secs(2);

/// Redis-backed store. Values are plain string keys with no expiry.
///
/// One managed connection is opened on first use and shared by every call;
/// it reconnects on its own after a dropped link.
pub struct RedisStore {
    client: redis::Client,
    conn: OnceCell<ConnectionManager>,
    op_timeout: Duration,
}

impl RedisStore {
    /// Validates the URL; no connection is made until first use.
    pub fn open(url: &str, op_timeout: Duration) -> Result<Self, StoreError> {
        Ok(Self {
            client: redis::Client::open(url)?,
            conn: OnceCell::new(),
            op_timeout,
        })
    }

    async fn connection(&self) -> Result<ConnectionManager, StoreError> {
        let conn = self
            .conn
            .get_or_try_init(|| ConnectionManager::new(self.client.clone()))
            .await?;
        Ok(conn.clone())
    }

    async fn bounded<T, F>(&self, op: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        tokio::time::timeout(self.op_timeout, op)
            .await
            .map_err(|_| StoreError::Timeout(self.op_timeout))?
    }
}

#[async_trait]
impl ResultStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<Bytes>, StoreError> {
        self.bounded(async {
            let mut conn = self.connection().await?;
            let value: Option<Vec<u8>> = conn.get(key).await?;
            Ok(value.map(Bytes::from))
        })
        .await
    }

    async fn set(&self, key: &str, value: Bytes) -> Result<(), StoreError> {
        self.bounded(async {
            let mut conn = self.connection().await?;
            conn.set::<_, _, ()>(key, value.to_vec()).await?;
            Ok(())
        })
        .await
    }
}

//! Persisted result slot: a narrow key/value store used to hand the latest
//! AnalysisResult from the submission flow to the results view.
//!
//! Carried in `AppState` as `Arc<dyn ResultStore>`. In-memory by default;
//! Redis when `RESULT_STORE_URL` is set.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use tracing::info;

pub mod memory;
pub mod redis_store;

pub use memory::MemoryStore;
pub use redis_store::{RedisStore, REDIS_OP_TIMEOUT};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Store operation timed out after {0:?}")]
    Timeout(Duration),
}

#[async_trait]
pub trait ResultStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Bytes>, StoreError>;

    /// Overwrites any previous value under `key`.
    async fn set(&self, key: &str, value: Bytes) -> Result<(), StoreError>;
}

/// Picks the store backend from configuration.
pub fn build_store(result_store_url: Option<&str>) -> anyhow::Result<Arc<dyn ResultStore>> {
    match result_store_url {
        Some(url) => {
            let store = RedisStore::open(url, REDIS_OP_TIMEOUT)?;
            info!("Result store: redis");
            Ok(Arc::new(store))
        }
        None => {
            info!("Result store: in-memory");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

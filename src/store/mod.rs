pub mod keys;
pub mod memory_store;
pub mod publisher;
pub mod redis_store;

pub use keys::{LeaderboardMetric, LeaderboardScope};
pub use memory_store::MemoryStore;
pub use publisher::{PublishError, PublishOptions, PublishReport, SnapshotPublisher};
pub use redis_store::RedisStore;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Store unavailable: {0}")]
    Unavailable(String)
}

/// A single write against the key-value store.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreOp {
    /// `HSET key field value`
    HashSet { key: String, field: String, value: String },
    /// `ZADD key score member`
    SortedSetAdd { key: String, member: String, score: f64 }
}

/// The key-value store a snapshot is published to.
///
/// `write_batch` must apply all of its operations or none of them, so a
/// failed batch can be retried without leaving half-written players behind.
#[allow(async_fn_in_trait)]
pub trait SnapshotStore {
    async fn write_batch(&self, ops: &[StoreOp]) -> Result<(), StoreError>;

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    async fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// Keys matching a glob. Only a trailing `*` needs to be supported.
    async fn keys(&self, pattern: &str) -> Result<Vec<String>, StoreError>;

    /// Renames each `(from, to)` pair and deletes `stale`, all or nothing.
    async fn swap(&self, renames: &[(String, String)], stale: &[String]) -> Result<(), StoreError>;

    /// Removes every key. Only used on startup when asked to.
    async fn flush(&self) -> Result<(), StoreError>;
}

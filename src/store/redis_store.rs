use super::{SnapshotStore, StoreError, StoreOp};
use redis::{aio::MultiplexedConnection, AsyncCommands};
use std::time::Instant;
use tracing::{debug, info};

const SCAN_COUNT: usize = 1000;

/// Redis-backed store. The multiplexed connection is cheap to clone, so
/// concurrent batches share one socket.
#[derive(Clone)]
pub struct RedisStore {
    connection: MultiplexedConnection
}

impl RedisStore {
    pub async fn connect(url: &str) -> Result<RedisStore, StoreError> {
        let client = redis::Client::open(url)?;
        let connection = client.get_multiplexed_async_connection().await?;

        info!("Connected to Redis");

        Ok(RedisStore { connection })
    }

    /// Dropping the last handle closes the connection.
    pub fn close(self) {
        drop(self.connection);
        info!("Closed Redis connection");
    }
}

impl SnapshotStore for RedisStore {
    async fn write_batch(&self, ops: &[StoreOp]) -> Result<(), StoreError> {
        let start = Instant::now();
        let mut pipe = redis::pipe();
        pipe.atomic();

        for op in ops {
            match op {
                StoreOp::HashSet { key, field, value } => {
                    pipe.hset(key, field, value).ignore();
                }
                StoreOp::SortedSetAdd { key, member, score } => {
                    pipe.zadd(key, member, *score).ignore();
                }
            }
        }

        let mut connection = self.connection.clone();
        let _: () = pipe.query_async(&mut connection).await?;

        debug!("Wrote {} operations in {:?}", ops.len(), start.elapsed());

        Ok(())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut connection = self.connection.clone();
        let _: () = connection.set(key, value).await?;

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let mut connection = self.connection.clone();
        let _: () = connection.del(key).await?;

        Ok(())
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>, StoreError> {
        let mut connection = self.connection.clone();
        let mut keys = Vec::new();
        let mut cursor: u64 = 0;

        loop {
            let (next, page): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(SCAN_COUNT)
                .query_async(&mut connection)
                .await?;

            keys.extend(page);
            cursor = next;

            if cursor == 0 {
                break;
            }
        }

        // SCAN may return a key more than once
        keys.sort_unstable();
        keys.dedup();

        Ok(keys)
    }

    async fn swap(&self, renames: &[(String, String)], stale: &[String]) -> Result<(), StoreError> {
        if renames.is_empty() && stale.is_empty() {
            return Ok(());
        }

        let mut pipe = redis::pipe();
        pipe.atomic();

        for (from, to) in renames {
            pipe.rename(from, to).ignore();
        }
        for key in stale {
            pipe.del(key).ignore();
        }

        let mut connection = self.connection.clone();
        let _: () = pipe.query_async(&mut connection).await?;

        debug!("Renamed {} keys, deleted {} stale keys", renames.len(), stale.len());

        Ok(())
    }

    async fn flush(&self) -> Result<(), StoreError> {
        let mut connection = self.connection.clone();
        let _: () = redis::cmd("FLUSHALL").query_async(&mut connection).await?;

        info!("Flushed Redis");

        Ok(())
    }
}

//! Store abstraction over the share-tracking key space.
//!
//! All shared state lives behind [`ShareStore`]; handlers stay stateless and
//! correctness rests on two store guarantees: the conditional `SET NX EX`
//! used by the dedup gate, and the `MULTI`/`EXEC` batch used by
//! [`ShareStore::apply_event`]. The trait is injected through
//! [`crate::state::AppState`], so tests swap in [`MemoryStore`] without a
//! running Redis.

use async_trait::async_trait;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("store unavailable")]
    Unavailable,
}

/// One accepted event's full set of counter mutations. Applied as a single
/// indivisible batch: a concurrent reader sees all of it or none of it.
#[derive(Debug, Clone)]
pub struct EventBatch {
    /// Plain increments: content total, per-platform, global total.
    pub counters: Vec<String>,
    /// Time-bucket increments, each with the TTL to (re)apply so buckets
    /// expire relative to last write.
    pub buckets: Vec<(String, u64)>,
    /// Last-shared timestamp, `(key, value)`.
    pub last_shared: (String, String),
    /// Leaderboard increment, `(sorted-set key, member)`.
    pub leaderboard: (String, String),
    /// Platform histogram increment, `(hash key, field)`.
    pub histogram: (String, String),
}

#[async_trait]
pub trait ShareStore: Send + Sync {
    /// Atomic create-if-absent with expiry. Returns true iff the key was
    /// created by this call; exactly one concurrent caller wins.
    async fn set_nx_ex(&self, key: &str, ttl_secs: u64) -> Result<bool, StoreError>;

    /// Apply every mutation in `batch` as one indivisible operation.
    async fn apply_event(&self, batch: &EventBatch) -> Result<(), StoreError>;

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    async fn get_many(&self, keys: &[String]) -> Result<Vec<Option<String>>, StoreError>;

    /// Push to the head of a list, trim it to `cap` entries and refresh its
    /// TTL, in one batch.
    async fn push_capped(
        &self,
        key: &str,
        entry: &str,
        cap: usize,
        ttl_secs: u64,
    ) -> Result<(), StoreError>;

    /// Up to `limit` list entries, head (most recent) first.
    async fn list_range(&self, key: &str, limit: usize) -> Result<Vec<String>, StoreError>;

    /// Top `n` members of a sorted set by descending score.
    async fn ranked_top(&self, key: &str, n: usize) -> Result<Vec<(String, u64)>, StoreError>;

    async fn ranked_len(&self, key: &str) -> Result<u64, StoreError>;

    async fn ranked_remove(&self, key: &str, member: &str) -> Result<(), StoreError>;

    /// All `(field, count)` pairs of a hash. Malformed counts are skipped.
    async fn hash_all(&self, key: &str) -> Result<Vec<(String, u64)>, StoreError>;

    /// Delete the given keys, returning how many existed.
    async fn delete(&self, keys: &[String]) -> Result<u64, StoreError>;

    /// Scan-and-delete every key under `prefix`, returning how many were
    /// removed. Operational resets only.
    async fn delete_prefix(&self, prefix: &str) -> Result<u64, StoreError>;
}

pub struct RedisStore {
    connection: redis::aio::ConnectionManager,
}

impl RedisStore {
    pub fn new(connection: redis::aio::ConnectionManager) -> Self {
        Self { connection }
    }
}

#[async_trait]
impl ShareStore for RedisStore {
    async fn set_nx_ex(&self, key: &str, ttl_secs: u64) -> Result<bool, StoreError> {
        let mut connection = self.connection.clone();

        let reply: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(1)
            .arg("NX")
            .arg("EX")
            .arg(ttl_secs)
            .query_async(&mut connection)
            .await?;

        Ok(reply.is_some())
    }

    async fn apply_event(&self, batch: &EventBatch) -> Result<(), StoreError> {
        let mut pipe = redis::pipe();
        pipe.atomic();

        for key in &batch.counters {
            pipe.incr(key, 1).ignore();
        }
        for (key, ttl_secs) in &batch.buckets {
            pipe.incr(key, 1).ignore();
            pipe.expire(key, *ttl_secs as i64).ignore();
        }
        pipe.set(&batch.last_shared.0, &batch.last_shared.1).ignore();
        pipe.zincr(&batch.leaderboard.0, &batch.leaderboard.1, 1)
            .ignore();
        pipe.hincr(&batch.histogram.0, &batch.histogram.1, 1)
            .ignore();

        let mut connection = self.connection.clone();
        let _: () = pipe.query_async(&mut connection).await?;

        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut connection = self.connection.clone();

        let value: Option<String> = redis::cmd("GET")
            .arg(key)
            .query_async(&mut connection)
            .await?;

        Ok(value)
    }

    async fn get_many(&self, keys: &[String]) -> Result<Vec<Option<String>>, StoreError> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let mut connection = self.connection.clone();

        let values: Vec<Option<String>> = redis::cmd("MGET")
            .arg(keys)
            .query_async(&mut connection)
            .await?;

        Ok(values)
    }

    async fn push_capped(
        &self,
        key: &str,
        entry: &str,
        cap: usize,
        ttl_secs: u64,
    ) -> Result<(), StoreError> {
        let mut pipe = redis::pipe();
        pipe.atomic();
        pipe.lpush(key, entry).ignore();
        pipe.ltrim(key, 0, cap as isize - 1).ignore();
        pipe.expire(key, ttl_secs as i64).ignore();

        let mut connection = self.connection.clone();
        let _: () = pipe.query_async(&mut connection).await?;

        Ok(())
    }

    async fn list_range(&self, key: &str, limit: usize) -> Result<Vec<String>, StoreError> {
        let mut connection = self.connection.clone();

        let entries: Vec<String> = redis::cmd("LRANGE")
            .arg(key)
            .arg(0)
            .arg(limit as isize - 1)
            .query_async(&mut connection)
            .await?;

        Ok(entries)
    }

    async fn ranked_top(&self, key: &str, n: usize) -> Result<Vec<(String, u64)>, StoreError> {
        let mut connection = self.connection.clone();

        let members: Vec<(String, f64)> = redis::cmd("ZREVRANGE")
            .arg(key)
            .arg(0)
            .arg(n as isize - 1)
            .arg("WITHSCORES")
            .query_async(&mut connection)
            .await?;

        Ok(members
            .into_iter()
            .map(|(member, score)| (member, score.max(0.0) as u64))
            .collect())
    }

    async fn ranked_len(&self, key: &str) -> Result<u64, StoreError> {
        let mut connection = self.connection.clone();

        let len: u64 = redis::cmd("ZCARD")
            .arg(key)
            .query_async(&mut connection)
            .await?;

        Ok(len)
    }

    async fn ranked_remove(&self, key: &str, member: &str) -> Result<(), StoreError> {
        let mut connection = self.connection.clone();

        let _: u64 = redis::cmd("ZREM")
            .arg(key)
            .arg(member)
            .query_async(&mut connection)
            .await?;

        Ok(())
    }

    async fn hash_all(&self, key: &str) -> Result<Vec<(String, u64)>, StoreError> {
        let mut connection = self.connection.clone();

        let raw: Vec<(String, String)> = redis::cmd("HGETALL")
            .arg(key)
            .query_async(&mut connection)
            .await?;

        Ok(raw
            .into_iter()
            .filter_map(|(field, value)| match value.parse::<u64>() {
                Ok(count) => Some((field, count)),
                Err(_) => {
                    warn!("Skipping malformed histogram count for {field:?}: {value:?}");
                    None
                }
            })
            .collect())
    }

    async fn delete(&self, keys: &[String]) -> Result<u64, StoreError> {
        if keys.is_empty() {
            return Ok(0);
        }

        let mut connection = self.connection.clone();

        let removed: u64 = redis::cmd("DEL")
            .arg(keys)
            .query_async(&mut connection)
            .await?;

        Ok(removed)
    }

    async fn delete_prefix(&self, prefix: &str) -> Result<u64, StoreError> {
        let mut connection = self.connection.clone();
        let pattern = format!("{prefix}*");

        let mut keys: Vec<String> = Vec::new();
        let mut cursor: u64 = 0;
        loop {
            let (next, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(200)
                .query_async(&mut connection)
                .await?;

            keys.extend(batch);
            if next == 0 {
                break;
            }
            cursor = next;
        }

        let mut removed = 0;
        for chunk in keys.chunks(500) {
            let count: u64 = redis::cmd("DEL")
                .arg(chunk)
                .query_async(&mut connection)
                .await?;
            removed += count;
        }

        Ok(removed)
    }
}

#[cfg(test)]
pub use memory::MemoryStore;

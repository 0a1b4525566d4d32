//! Redis-backed key-value store.
//!
//! Uses a multiplexed `ConnectionManager`, which reconnects on its own after
//! a dropped connection. Every operation maps to a single Redis command:
//! `GET`, `PSETEX` and `INCR`.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, ErrorKind, RedisError};
use tracing::{debug, info, instrument};

use tally_core::error::{Result, TallyError};
use tally_core::traits::KeyValueStore;

/// Redis key-value store.
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
}

impl RedisStore {
    /// Connects to the Redis server at `url` (e.g. `redis://127.0.0.1:6379/0`).
    #[instrument(skip(url))]
    pub async fn connect(url: &str) -> Result<Self> {
        let client = Self::client(url)?;
        let conn = ConnectionManager::new(client)
            .await
            .map_err(|e| TallyError::StoreUnavailable(e.to_string()))?;

        info!("Connected to Redis");
        Ok(Self { conn })
    }

    fn client(url: &str) -> Result<redis::Client> {
        redis::Client::open(url)
            .map_err(|e| TallyError::ConfigError(format!("invalid Redis URL: {}", e)))
    }
}

impl std::fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore").finish_non_exhaustive()
    }
}

/// Maps a Redis error onto the store error taxonomy.
fn map_redis_error(key: &str, err: RedisError) -> TallyError {
    if err.kind() == ErrorKind::ResponseError && err.to_string().contains("not an integer") {
        return TallyError::NotAnInteger(key.to_string());
    }
    debug!(key, error = %err, "Redis command failed");
    TallyError::StoreUnavailable(err.to_string())
}

/// PSETEX takes whole milliseconds as a signed 64-bit integer; sub-millisecond
/// TTLs round up and longer ones are rejected.
fn ttl_millis(key: &str, ttl: Duration) -> Result<i64> {
    i64::try_from(ttl.as_millis().max(1)).map_err(|_| {
        TallyError::ValidationError(format!("expiry for '{}' is out of range: {:?}", key, ttl))
    })
}

#[async_trait]
impl KeyValueStore for RedisStore {
    fn name(&self) -> &'static str {
        "redis"
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.conn.clone();
        conn.get::<_, Option<String>>(key)
            .await
            .map_err(|e| map_redis_error(key, e))
    }

    async fn set_with_expiry(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        if ttl.is_zero() {
            return Err(TallyError::ValidationError(format!(
                "expiry for '{}' must be greater than zero",
                key
            )));
        }
        let millis = ttl_millis(key, ttl)?;
        let mut conn = self.conn.clone();
        conn.pset_ex::<_, _, ()>(key, value, millis as u64)
            .await
            .map_err(|e| map_redis_error(key, e))
    }

    async fn increment(&self, key: &str) -> Result<i64> {
        let mut conn = self.conn.clone();
        let count: i64 = redis::cmd("INCR")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(|e| map_redis_error(key, e))?;
        Ok(count)
    }
}

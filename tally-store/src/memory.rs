//! In-memory key-value store.
//!
//! Fast, thread-safe storage with Redis-like semantics: string values,
//! per-key expiry enforced on read, and atomic integer increments.

use std::sync::{Arc, Weak};
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, instrument, trace};

use tally_core::error::{Result, TallyError};
use tally_core::traits::KeyValueStore;

const MIN_PURGE_PERIOD: Duration = Duration::from_millis(1);

/// Stored value with an optional deadline.
#[derive(Clone, Debug)]
struct StoredValue {
    value: String,
    expires_at: Option<Instant>,
}

impl StoredValue {
    fn persistent(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            expires_at: None,
        }
    }

    /// Returns `None` when the deadline is past what the clock can represent.
    fn expiring(value: impl Into<String>, ttl: Duration) -> Option<Self> {
        let deadline = Instant::now().checked_add(ttl)?;
        Some(Self {
            value: value.into(),
            expires_at: Some(deadline),
        })
    }

    /// An entry is dead from its deadline onwards.
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|deadline| now >= deadline)
    }
}

/// In-memory key-value store.
///
/// Keys live in a sharded `DashMap`, so each operation only locks the shard
/// holding its key. Expired entries are never returned; they are dropped
/// lazily on access or in bulk by [`purge_expired`](Self::purge_expired).
///
/// Time is read from `tokio::time`, so paused-clock tests can step over a
/// TTL without sleeping.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<String, StoredValue>,
}

impl MemoryStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Creates a store with preallocated capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: DashMap::with_capacity(capacity),
        }
    }

    /// Returns the number of stored keys, including expired ones not yet purged.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Removes every key.
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Drops all expired entries and returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, v| !v.is_expired(now));
        let removed = before.saturating_sub(self.entries.len());
        if removed > 0 {
            debug!(removed, "Purged expired entries");
        }
        removed
    }

    /// Spawns a task that purges expired entries every `every`.
    ///
    /// Periods under one millisecond are raised to one millisecond. The task
    /// holds a weak handle and exits once the store is dropped.
    pub fn spawn_purge_task(self: &Arc<Self>, every: Duration) -> JoinHandle<()> {
        let store: Weak<Self> = Arc::downgrade(self);
        let every = every.max(MIN_PURGE_PERIOD);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                match store.upgrade() {
                    Some(store) => {
                        store.purge_expired();
                    }
                    None => break,
                }
            }
        })
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let now = Instant::now();
        let Some(entry) = self.entries.get(key) else {
            return Ok(None);
        };
        if !entry.is_expired(now) {
            return Ok(Some(entry.value.clone()));
        }
        drop(entry); // release the shard read lock before removing
        self.entries.remove_if(key, |_, v| v.is_expired(now));
        trace!(key, "Dropped expired entry on read");
        Ok(None)
    }

    async fn set_with_expiry(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        if ttl.is_zero() {
            return Err(TallyError::ValidationError(format!(
                "expiry for '{}' must be greater than zero",
                key
            )));
        }
        let stored = StoredValue::expiring(value, ttl).ok_or_else(|| {
            TallyError::ValidationError(format!("expiry for '{}' is out of range: {:?}", key, ttl))
        })?;
        self.entries.insert(key.to_string(), stored);
        Ok(())
    }

    #[instrument(skip(self))]
    async fn increment(&self, key: &str) -> Result<i64> {
        let now = Instant::now();
        // The entry guard holds the shard write lock, so read-parse-write
        // below is atomic with respect to other callers on this key.
        let mut entry = self
            .entries
            .entry(key.to_string())
            .or_insert_with(|| StoredValue::persistent("0"));
        if entry.is_expired(now) {
            *entry = StoredValue::persistent("0");
        }

        let current: i64 = entry
            .value
            .parse()
            .map_err(|_| TallyError::NotAnInteger(key.to_string()))?;
        let next = current
            .checked_add(1)
            .ok_or_else(|| TallyError::InternalError(format!("increment would overflow at '{}'", key)))?;

        // Keeps any existing expiry, like Redis INCR.
        entry.value = next.to_string();
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TTL: Duration = Duration::from_secs(10);

    #[tokio::test]
    async fn test_get_missing() {
        let store = MemoryStore::new();
        assert_eq!(store.get("nope").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_get() {
        let store = MemoryStore::new();
        store.set_with_expiry("result:a", "page", TTL).await.unwrap();
        assert_eq!(store.get("result:a").await.unwrap().as_deref(), Some("page"));
    }

    #[tokio::test]
    async fn test_set_overwrites() {
        let store = MemoryStore::new();
        store.set_with_expiry("k", "one", TTL).await.unwrap();
        store.set_with_expiry("k", "two", TTL).await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("two"));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_zero_ttl_rejected() {
        let store = MemoryStore::new();
        let err = store
            .set_with_expiry("k", "v", Duration::ZERO)
            .await
            .unwrap_err();
        assert!(matches!(err, TallyError::ValidationError(_)));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_unrepresentable_ttl_rejected() {
        let store = MemoryStore::new();
        let err = store
            .set_with_expiry("k", "v", Duration::from_secs(u64::MAX))
            .await
            .unwrap_err();
        assert!(matches!(err, TallyError::ValidationError(_)));
        assert!(store.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_expires() {
        let store = MemoryStore::new();
        store.set_with_expiry("k", "v", TTL).await.unwrap();

        tokio::time::advance(TTL - Duration::from_millis(1)).await;
        assert!(store.get("k").await.unwrap().is_some());

        tokio::time::advance(Duration::from_millis(2)).await;
        assert!(store.get("k").await.unwrap().is_none());
        // Lazily removed on that read
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_increment_starts_at_one() {
        let store = MemoryStore::new();
        assert_eq!(store.increment("count:a").await.unwrap(), 1);
        assert_eq!(store.increment("count:a").await.unwrap(), 2);
        assert_eq!(store.increment("count:b").await.unwrap(), 1);
        assert_eq!(store.get("count:a").await.unwrap().as_deref(), Some("2"));
    }

    #[tokio::test]
    async fn test_increment_non_integer() {
        let store = MemoryStore::new();
        store.set_with_expiry("k", "hello", TTL).await.unwrap();
        let err = store.increment("k").await.unwrap_err();
        assert!(matches!(err, TallyError::NotAnInteger(ref k) if k == "k"));
        // Value untouched
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("hello"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_counter_never_expires() {
        let store = MemoryStore::new();
        store.increment("count:a").await.unwrap();
        tokio::time::advance(Duration::from_secs(3600)).await;
        assert_eq!(store.increment("count:a").await.unwrap(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_increment_restarts_expired_value() {
        let store = MemoryStore::new();
        store.set_with_expiry("k", "41", TTL).await.unwrap();
        assert_eq!(store.increment("k").await.unwrap(), 42);

        tokio::time::advance(TTL + Duration::from_millis(1)).await;
        assert_eq!(store.increment("k").await.unwrap(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_purge_expired() {
        let store = MemoryStore::new();
        store.set_with_expiry("short", "v", Duration::from_secs(1)).await.unwrap();
        store.set_with_expiry("long", "v", TTL).await.unwrap();
        store.increment("count").await.unwrap();

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(store.purge_expired(), 1);
        assert_eq!(store.len(), 2);
        assert!(store.get("long").await.unwrap().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_purge_task_runs_and_stops() {
        let store = Arc::new(MemoryStore::new());
        store.set_with_expiry("k", "v", Duration::from_secs(1)).await.unwrap();

        let handle = store.spawn_purge_task(Duration::from_secs(5));
        tokio::time::sleep(Duration::from_secs(6)).await;
        assert!(store.is_empty());

        drop(store);
        tokio::time::sleep(Duration::from_secs(6)).await;
        assert!(handle.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn test_purge_task_zero_period() {
        let store = Arc::new(MemoryStore::new());
        store.set_with_expiry("k", "v", Duration::from_secs(1)).await.unwrap();

        let handle = store.spawn_purge_task(Duration::ZERO);
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(store.is_empty());

        drop(store);
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(handle.is_finished());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_increments_are_atomic() {
        let store = Arc::new(MemoryStore::new());
        let tasks: Vec<_> = (0..200)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.increment("count:hot").await.unwrap() })
            })
            .collect();

        let mut seen: Vec<i64> = futures::future::join_all(tasks)
            .await
            .into_iter()
            .map(|r| r.unwrap())
            .collect();
        seen.sort_unstable();

        assert_eq!(seen, (1..=200).collect::<Vec<_>>());
        assert_eq!(store.get("count:hot").await.unwrap().as_deref(), Some("200"));
    }

    proptest::proptest! {
        #[test]
        fn prop_increment_counts_every_call(n in 1usize..64) {
            let rt = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
            let last = rt.block_on(async {
                let store = MemoryStore::new();
                let mut last = 0;
                for _ in 0..n {
                    last = store.increment("count:p").await.unwrap();
                }
                last
            });
            proptest::prop_assert_eq!(last, n as i64);
        }
    }
}

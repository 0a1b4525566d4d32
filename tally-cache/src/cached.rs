//! Counting read-through cache.

use async_trait::async_trait;
use tracing::{debug, instrument, warn};

use tally_core::error::{Result, TallyError};
use tally_core::traits::{KeyValueStore, ResourceFetcher};
use tally_core::types::{CacheConfig, CacheOutcome, Lookup};

/// Read-through cache that counts every access.
///
/// Each call:
/// 1. Atomically increments the access counter (`count:<key>`)
/// 2. Returns the live cache entry (`result:<key>`) if there is one
/// 3. Otherwise fetches, stores the value for the configured TTL, and returns it
///
/// The counter reflects attempts, not successes: it is bumped before
/// anything else and never rolled back. A failed fetch writes nothing.
///
/// No lock is held across the fetch. Concurrent misses on one key each
/// fetch and write; the last write wins.
///
/// The store is a handle to something owned elsewhere (`Arc<MemoryStore>`,
/// a cloned `RedisStore`, ...). Keys are trimmed of surrounding whitespace
/// before use; see [`CacheConfig::normalize_key`].
pub struct CachedFetcher<S, F> {
    store: S,
    fetcher: F,
    config: CacheConfig,
}

impl<S, F> CachedFetcher<S, F>
where
    S: KeyValueStore,
    F: ResourceFetcher,
{
    /// Creates a cached fetcher with the default config (10s TTL).
    pub fn new(store: S, fetcher: F) -> Self {
        Self {
            store,
            fetcher,
            config: CacheConfig::default(),
        }
    }

    /// Creates a cached fetcher with a custom config.
    pub fn with_config(store: S, fetcher: F, config: CacheConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            store,
            fetcher,
            config,
        })
    }

    /// Returns the cache config.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Returns the store handle.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns the wrapped fetcher.
    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Returns the cached value for `key`, fetching and caching it on a miss.
    pub async fn get_or_fetch(&self, key: &str) -> Result<String> {
        self.lookup(key).await.map(|lookup| lookup.value)
    }

    /// Same as [`get_or_fetch`](Self::get_or_fetch), but also reports the
    /// access count after this call and whether it was a hit.
    #[instrument(skip(self), fields(store = self.store.name()))]
    pub async fn lookup(&self, key: &str) -> Result<Lookup> {
        let key = CacheConfig::normalize_key(key)?;
        let keys = self.config.store_keys(key)?;

        let count = self.store.increment(&keys.count).await?;
        let access_count = u64::try_from(count).map_err(|_| {
            TallyError::InternalError(format!("negative access count {} at '{}'", count, keys.count))
        })?;

        if let Some(value) = self.store.get(&keys.result).await? {
            debug!(access_count, "Cache hit");
            return Ok(Lookup::new(value, access_count, CacheOutcome::Hit));
        }

        debug!(access_count, "Cache miss, fetching");

        let value = match self.fetcher.fetch(key).await {
            Ok(value) => value,
            Err(err) => {
                warn!(error = %err, "Fetch failed, nothing cached");
                return Err(err);
            }
        };

        self.store
            .set_with_expiry(&keys.result, &value, self.config.ttl())
            .await?;

        debug!(bytes = value.len(), ttl_seconds = self.config.ttl_seconds, "Cached fetched value");
        Ok(Lookup::new(value, access_count, CacheOutcome::Miss))
    }

    /// Reads the access counter for `key` without incrementing it.
    ///
    /// Keys never looked up report 0.
    pub async fn access_count(&self, key: &str) -> Result<u64> {
        let keys = self.config.store_keys(key)?;
        match self.store.get(&keys.count).await? {
            None => Ok(0),
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| TallyError::NotAnInteger(keys.count)),
        }
    }
}

impl<S, F> std::fmt::Debug for CachedFetcher<S, F>
where
    S: KeyValueStore,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedFetcher")
            .field("store", &self.store.name())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// A cached fetcher is itself a fetcher with the same signature, so it can
/// stand in wherever the wrapped fetcher was used.
#[async_trait]
impl<S, F> ResourceFetcher for CachedFetcher<S, F>
where
    S: KeyValueStore,
    F: ResourceFetcher,
{
    async fn fetch(&self, key: &str) -> Result<String> {
        self.get_or_fetch(key).await
    }
}

/// Adds [`cached`](ResourceFetcherExt::cached) to every [`ResourceFetcher`].
pub trait ResourceFetcherExt: ResourceFetcher + Sized {
    /// Wraps this fetcher in a [`CachedFetcher`] over `store`.
    fn cached<S: KeyValueStore>(self, store: S, config: CacheConfig) -> Result<CachedFetcher<S, Self>> {
        CachedFetcher::with_config(store, self, config)
    }
}

impl<T: ResourceFetcher> ResourceFetcherExt for T {}

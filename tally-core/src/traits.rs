//! Common traits for Tally.
//!
//! The cached fetcher talks to the outside world only through these two
//! traits, so stores and fetchers can be swapped for test doubles.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;

// ═══════════════════════════════════════════════════════════════════════════════
// KEY-VALUE STORE TRAIT
// ═══════════════════════════════════════════════════════════════════════════════

/// Interface for the shared key-value store.
///
/// Implementations might use:
/// - In-memory storage (for testing/single-process use)
/// - Redis (for shared deployments)
///
/// The store owns expiry: once the TTL given to [`set_with_expiry`] has
/// elapsed, [`get`] must report the key as absent.
///
/// [`set_with_expiry`]: KeyValueStore::set_with_expiry
/// [`get`]: KeyValueStore::get
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Short backend name for logs (e.g. `"memory"`, `"redis"`).
    fn name(&self) -> &'static str;

    /// Returns the current value, or `None` if missing or expired.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores a value that becomes unreadable after `ttl`.
    async fn set_with_expiry(&self, key: &str, value: &str, ttl: Duration) -> Result<()>;

    /// Atomically adds 1 to the integer at `key`, creating it at 0 first.
    ///
    /// Returns the new value.
    async fn increment(&self, key: &str) -> Result<i64>;
}

#[async_trait]
impl<T: KeyValueStore + ?Sized> KeyValueStore for Arc<T> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key).await
    }

    async fn set_with_expiry(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        (**self).set_with_expiry(key, value, ttl).await
    }

    async fn increment(&self, key: &str) -> Result<i64> {
        (**self).increment(key).await
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// RESOURCE FETCHER TRAIT
// ═══════════════════════════════════════════════════════════════════════════════

/// Interface for fetching the resource behind a key.
///
/// Fetches may be slow and may fail; failures should be fetch-class
/// [`TallyError`](crate::TallyError) variants.
#[async_trait]
pub trait ResourceFetcher: Send + Sync {
    /// Fetches the resource identified by `key`.
    async fn fetch(&self, key: &str) -> Result<String>;
}

#[async_trait]
impl<T: ResourceFetcher + ?Sized> ResourceFetcher for Arc<T> {
    async fn fetch(&self, key: &str) -> Result<String> {
        (**self).fetch(key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TallyError;

    struct Echo;

    #[async_trait]
    impl ResourceFetcher for Echo {
        async fn fetch(&self, key: &str) -> Result<String> {
            if key.is_empty() {
                return Err(TallyError::InvalidUrl("empty".into()));
            }
            Ok(key.to_uppercase())
        }
    }

    #[tokio::test]
    async fn test_arc_dyn_fetcher_delegates() {
        let fetcher: Arc<dyn ResourceFetcher> = Arc::new(Echo);
        assert_eq!(fetcher.fetch("abc").await.unwrap(), "ABC");
        assert!(fetcher.fetch("").await.unwrap_err().is_fetch_error());
    }
}

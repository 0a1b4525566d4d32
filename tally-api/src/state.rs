//! App state: store, fetcher, config.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use tally_cache::CachedFetcher;
use tally_core::error::{Result, TallyError};
use tally_core::traits::{KeyValueStore, ResourceFetcher};
use tally_core::types::CacheConfig;
use tally_http::{HttpConfig, HttpFetcher};
use tally_store::MemoryStore;

/// Store handle shared by all requests.
pub type SharedStore = Arc<dyn KeyValueStore>;

/// Fetcher shared by all requests.
pub type SharedFetcher = Arc<dyn ResourceFetcher>;

/// The cached fetcher served by the API.
pub type PageCache = CachedFetcher<SharedStore, SharedFetcher>;

const DEFAULT_PORT: u16 = 3001;
const DEFAULT_FETCH_TIMEOUT_SECONDS: u64 = 30;
const DEFAULT_PURGE_INTERVAL_SECONDS: u64 = 60;

const ENV_PORT: &str = "TALLY_PORT";
const ENV_REDIS_URL: &str = "REDIS_URL";
const ENV_FETCH_TIMEOUT_SECONDS: &str = "TALLY_FETCH_TIMEOUT_SECONDS";

/// API configuration.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Listening port
    pub port: u16,
    /// Redis URL; the in-memory store is used when unset
    pub redis_url: Option<String>,
    /// Timeout of each upstream fetch
    pub fetch_timeout_seconds: u64,
    /// How often the in-memory store drops expired entries
    pub purge_interval_seconds: u64,
    /// Cache TTL and key prefixes
    pub cache: CacheConfig,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            redis_url: None,
            fetch_timeout_seconds: DEFAULT_FETCH_TIMEOUT_SECONDS,
            purge_interval_seconds: DEFAULT_PURGE_INTERVAL_SECONDS,
            cache: CacheConfig::default(),
        }
    }
}

impl ApiConfig {
    /// Reads the config from the environment (and `.env`, if present).
    ///
    /// Unparsable values are a `ConfigError`, never a silent default.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds and validates the config from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        Ok(Self {
            port: parse_var(&lookup, ENV_PORT)?.unwrap_or(defaults.port),
            redis_url: lookup(ENV_REDIS_URL).filter(|v| !v.trim().is_empty()),
            fetch_timeout_seconds: parse_var(&lookup, ENV_FETCH_TIMEOUT_SECONDS)?
                .unwrap_or(defaults.fetch_timeout_seconds),
            purge_interval_seconds: defaults.purge_interval_seconds,
            cache: CacheConfig::from_lookup(&lookup)?,
        })
    }
}

fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Result<Option<T>> {
    lookup(name)
        .map(|raw| {
            raw.trim()
                .parse()
                .map_err(|_| TallyError::ConfigError(format!("{} is not valid: '{}'", name, raw)))
        })
        .transpose()
}

/// Shared application state.
pub struct AppState {
    /// Config the state was built from
    pub config: ApiConfig,
    /// The cached fetcher
    pub cache: PageCache,
}

impl AppState {
    /// Connects the configured store and builds the HTTP fetcher.
    pub async fn from_config(config: ApiConfig) -> Result<Self> {
        let store = connect_store(&config).await?;
        let http = HttpConfig::default().with_timeout_seconds(config.fetch_timeout_seconds);
        let fetcher: SharedFetcher = Arc::new(HttpFetcher::with_config(http)?);
        Self::with_parts(config, store, fetcher)
    }

    /// Builds state from an explicit store and fetcher.
    pub fn with_parts(config: ApiConfig, store: SharedStore, fetcher: SharedFetcher) -> Result<Self> {
        let cache = CachedFetcher::with_config(store, fetcher, config.cache.clone())?;
        Ok(Self { config, cache })
    }
}

async fn connect_store(config: &ApiConfig) -> Result<SharedStore> {
    if let Some(url) = &config.redis_url {
        return connect_redis(url).await;
    }

    let store = Arc::new(MemoryStore::new());
    store.spawn_purge_task(Duration::from_secs(config.purge_interval_seconds.max(1)));
    info!("Using in-memory store");
    Ok(store)
}

#[cfg(feature = "redis")]
async fn connect_redis(url: &str) -> Result<SharedStore> {
    let store = tally_store::RedisStore::connect(url).await?;
    Ok(Arc::new(store))
}

#[cfg(not(feature = "redis"))]
async fn connect_redis(_url: &str) -> Result<SharedStore> {
    tracing::warn!("REDIS_URL is set but this build has no Redis support");
    Err(TallyError::ConfigError(
        "Redis support not compiled in (enable the `redis` feature)".into(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_from_lookup_defaults() {
        let config = ApiConfig::from_lookup(vars(&[])).unwrap();
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.redis_url, None);
        assert_eq!(config.cache, CacheConfig::default());
    }

    #[test]
    fn test_from_lookup_overrides() {
        let config = ApiConfig::from_lookup(vars(&[
            ("TALLY_PORT", "8080"),
            ("REDIS_URL", "redis://localhost:6379"),
            ("TALLY_TTL_SECONDS", "60"),
        ]))
        .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.redis_url.as_deref(), Some("redis://localhost:6379"));
        assert_eq!(config.cache.ttl_seconds, 60);
    }

    #[test]
    fn test_bad_ttl_is_config_error() {
        let err = ApiConfig::from_lookup(vars(&[("TALLY_TTL_SECONDS", "ten")])).unwrap_err();
        assert!(matches!(err, TallyError::ConfigError(_)));
    }

    #[test]
    fn test_bad_port_is_config_error() {
        let err = ApiConfig::from_lookup(vars(&[("TALLY_PORT", "http")])).unwrap_err();
        assert!(matches!(err, TallyError::ConfigError(ref m) if m.contains("TALLY_PORT")));
    }

    #[test]
    fn test_blank_redis_url_means_memory() {
        let config = ApiConfig::from_lookup(vars(&[("REDIS_URL", "  ")])).unwrap();
        assert_eq!(config.redis_url, None);
    }
}

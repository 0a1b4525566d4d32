//! Cache configuration and store key derivation.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_KEY_PREFIX_COUNT, DEFAULT_KEY_PREFIX_RESULT, DEFAULT_TTL_SECONDS, ENV_KEY_PREFIX_COUNT,
    ENV_KEY_PREFIX_RESULT, ENV_TTL_SECONDS, MAX_TTL_SECONDS,
};
use crate::error::{Result, TallyError};

/// The two store keys derived from one input key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoreKeys {
    /// Key of the cached fetch result
    pub result: String,
    /// Key of the access counter
    pub count: String,
}

/// Cache configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Expiry window of cache entries, in seconds
    pub ttl_seconds: u64,
    /// Prefix of result keys
    pub key_prefix_result: String,
    /// Prefix of counter keys
    pub key_prefix_count: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: DEFAULT_TTL_SECONDS,
            key_prefix_result: DEFAULT_KEY_PREFIX_RESULT.into(),
            key_prefix_count: DEFAULT_KEY_PREFIX_COUNT.into(),
        }
    }
}

impl CacheConfig {
    /// Reads the config from the environment, keeping defaults for unset or
    /// unparsable variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let lookup = |name: &str| std::env::var(name).ok();

        Self {
            ttl_seconds: lookup(ENV_TTL_SECONDS)
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.ttl_seconds),
            key_prefix_result: lookup(ENV_KEY_PREFIX_RESULT).unwrap_or(defaults.key_prefix_result),
            key_prefix_count: lookup(ENV_KEY_PREFIX_COUNT).unwrap_or(defaults.key_prefix_count),
        }
    }

    /// Reads and validates the config from the environment.
    pub fn try_from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds and validates a config from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_TTL_SECONDS) {
            config.ttl_seconds = raw.trim().parse().map_err(|_| {
                TallyError::ConfigError(format!("{} must be an integer, got '{}'", ENV_TTL_SECONDS, raw))
            })?;
        }
        if let Some(prefix) = lookup(ENV_KEY_PREFIX_RESULT) {
            config.key_prefix_result = prefix;
        }
        if let Some(prefix) = lookup(ENV_KEY_PREFIX_COUNT) {
            config.key_prefix_count = prefix;
        }

        config.validate()?;
        Ok(config)
    }

    /// Sets the entry TTL in seconds.
    pub fn with_ttl_seconds(mut self, ttl_seconds: u64) -> Self {
        self.ttl_seconds = ttl_seconds;
        self
    }

    /// Sets both store key prefixes.
    pub fn with_prefixes(mut self, result: impl Into<String>, count: impl Into<String>) -> Self {
        self.key_prefix_result = result.into();
        self.key_prefix_count = count.into();
        self
    }

    /// Entry TTL as a `Duration`.
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }

    /// Checks the config for values that would break the cache contract.
    pub fn validate(&self) -> Result<()> {
        if self.ttl_seconds == 0 {
            return Err(TallyError::ConfigError("ttl_seconds must be at least 1".into()));
        }
        if self.ttl_seconds > MAX_TTL_SECONDS {
            return Err(TallyError::ConfigError(format!(
                "ttl_seconds must be at most {}, got {}",
                MAX_TTL_SECONDS, self.ttl_seconds
            )));
        }
        if self.key_prefix_result.is_empty() || self.key_prefix_count.is_empty() {
            return Err(TallyError::ConfigError("key prefixes cannot be empty".into()));
        }
        // Equal prefixes would put the counter and the entry on the same key.
        if self.key_prefix_result == self.key_prefix_count {
            return Err(TallyError::ConfigError(format!(
                "result and count prefixes must differ (both '{}')",
                self.key_prefix_result
            )));
        }
        Ok(())
    }

    /// Normalizes an input key: trims surrounding whitespace, nothing else.
    ///
    /// Keys are usually URLs, which are case-sensitive, so case is kept.
    pub fn normalize_key(key: &str) -> Result<&str> {
        let trimmed = key.trim();
        if trimmed.is_empty() {
            return Err(TallyError::ValidationError("key cannot be empty".into()));
        }
        Ok(trimmed)
    }

    /// Derives the counter and result store keys for `key`.
    pub fn store_keys(&self, key: &str) -> Result<StoreKeys> {
        let key = Self::normalize_key(key)?;
        Ok(StoreKeys {
            result: format!("{}{}", self.key_prefix_result, key),
            count: format!("{}{}", self.key_prefix_count, key),
        })
    }
}

//! # Tally Cache
//!
//! Read-through caching with per-key access counting.
//!
//! [`CachedFetcher`] wraps any [`ResourceFetcher`] and a [`KeyValueStore`].
//! Every call counts an access; live entries are served from the store;
//! misses are fetched and stored for the configured TTL.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tally_cache::{CachedFetcher, ResourceFetcherExt};
//! use tally_http::HttpFetcher;
//! use tally_store::MemoryStore;
//!
//! let store = Arc::new(MemoryStore::new());
//! let pages = HttpFetcher::new()?.cached(store, Default::default())?;
//!
//! let body = pages.get_or_fetch("http://example.com").await?;
//! let hits = pages.access_count("http://example.com").await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod cached;
mod func;

pub use cached::{CachedFetcher, ResourceFetcherExt};
pub use func::{fetcher_fn, FnFetcher};

pub use tally_core::traits::{KeyValueStore, ResourceFetcher};
pub use tally_core::types::{CacheConfig, CacheOutcome, Lookup};

//! # Tally Store
//!
//! Key-value store backends for the Tally cache.
//!
//! - **Memory**: in-process store with expiry and atomic counters, for tests
//!   and single-process deployments
//! - **Redis**: shared store for multi-process deployments (`redis` feature)
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::time::Duration;
//! use tally_store::{KeyValueStore, MemoryStore};
//!
//! let store = MemoryStore::new();
//! store.set_with_expiry("result:a", "page", Duration::from_secs(10)).await?;
//! assert_eq!(store.increment("count:a").await?, 1);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod memory;
#[cfg(feature = "redis")]
mod redis_store;

pub use memory::MemoryStore;
#[cfg(feature = "redis")]
pub use redis_store::RedisStore;

// Re-export the trait from core
pub use tally_core::traits::KeyValueStore;

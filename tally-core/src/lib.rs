//! # Tally Core
//!
//! Core types, errors, and traits for Tally, a read-through cache that also
//! counts every access to a key.
//!
//! This crate provides the foundational building blocks used by all other Tally crates:
//!
//! - **Types**: cache configuration, store key derivation, lookup results
//! - **Errors**: one error enum covering fetch, store, and validation failures
//! - **Constants**: default TTL and store key prefixes
//! - **Traits**: the [`KeyValueStore`] and [`ResourceFetcher`] collaborators
//!
//! ## Example
//!
//! ```rust
//! use tally_core::CacheConfig;
//!
//! let config = CacheConfig::default();
//! let keys = config.store_keys("http://example.com").unwrap();
//! assert_eq!(keys.count, "count:http://example.com");
//! assert_eq!(keys.result, "result:http://example.com");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, clippy::all)]

pub mod constants;
pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used items at crate root
pub use constants::*;
pub use error::{Result, TallyError};
pub use traits::*;
pub use types::*;

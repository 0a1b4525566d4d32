//! Domain types for Tally.
//!
//! - [`CacheConfig`]: TTL and store key templates
//! - [`StoreKeys`]: the two store keys derived from one input key
//! - [`Lookup`]: result of one cached fetch, with access count and outcome

mod config;
mod lookup;

pub use config::*;
pub use lookup::*;

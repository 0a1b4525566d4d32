//! HTTP resource fetcher for Tally.
//!
//! Treats each cache key as a URL and fetches its body as text.

mod fetcher;

pub use fetcher::{HttpConfig, HttpFetcher};

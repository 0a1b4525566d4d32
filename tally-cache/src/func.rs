//! Closure-backed resource fetchers.

use std::fmt;
use std::future::Future;

use async_trait::async_trait;

use tally_core::error::Result;
use tally_core::traits::ResourceFetcher;

/// A [`ResourceFetcher`] backed by an async closure.
///
/// Built with [`fetcher_fn`].
#[derive(Clone)]
pub struct FnFetcher<F> {
    f: F,
}

/// Turns an async closure `Fn(String) -> Future<Output = Result<String>>`
/// into a [`ResourceFetcher`].
///
/// ```rust,ignore
/// let upper = fetcher_fn(|key| async move { Ok(key.to_uppercase()) });
/// ```
pub fn fetcher_fn<F, Fut>(f: F) -> FnFetcher<F>
where
    F: Fn(String) -> Fut + Send + Sync,
    Fut: Future<Output = Result<String>> + Send + 'static,
{
    FnFetcher { f }
}

impl<F> fmt::Debug for FnFetcher<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnFetcher").finish_non_exhaustive()
    }
}

#[async_trait]
impl<F, Fut> ResourceFetcher for FnFetcher<F>
where
    F: Fn(String) -> Fut + Send + Sync,
    Fut: Future<Output = Result<String>> + Send + 'static,
{
    async fn fetch(&self, key: &str) -> Result<String> {
        (self.f)(key.to_string()).await
    }
}

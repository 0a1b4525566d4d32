//! HTTP fetcher implementation.
//!
//! Issues a plain `GET` per key. Any non-2xx status is a fetch error, so
//! error pages never end up in the cache.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, instrument, warn};
use url::Url;

use tally_core::error::{Result, TallyError};
use tally_core::traits::ResourceFetcher;

/// HTTP fetcher configuration.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// User-Agent header sent with every request
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            user_agent: concat!("tally/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl HttpConfig {
    /// Sets the request timeout.
    pub fn with_timeout_seconds(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }
}

/// Fetches resources over HTTP(S).
#[derive(Clone, Debug)]
pub struct HttpFetcher {
    config: HttpConfig,
    http_client: reqwest::Client,
}

impl HttpFetcher {
    /// Creates a fetcher with default configuration.
    pub fn new() -> Result<Self> {
        Self::with_config(HttpConfig::default())
    }

    /// Creates a fetcher with the given config.
    pub fn with_config(config: HttpConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| TallyError::ConfigError(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            config,
            http_client,
        })
    }

    /// Returns the fetcher config.
    pub fn config(&self) -> &HttpConfig {
        &self.config
    }

    /// Parses a key as an absolute http(s) URL.
    pub(crate) fn parse_url(&self, key: &str) -> Result<Url> {
        let url = Url::parse(key.trim())
            .map_err(|e| TallyError::InvalidUrl(format!("'{}': {}", key, e)))?;

        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(TallyError::InvalidUrl(format!(
                "'{}': unsupported scheme '{}'",
                key, other
            ))),
        }
    }

    fn map_transport_error(&self, key: &str, err: reqwest::Error) -> TallyError {
        if err.is_timeout() {
            TallyError::FetchTimeout {
                key: key.to_string(),
                seconds: self.config.timeout_seconds,
            }
        } else {
            TallyError::FetchFailed {
                key: key.to_string(),
                reason: err.to_string(),
            }
        }
    }
}

#[async_trait]
impl ResourceFetcher for HttpFetcher {
    #[instrument(skip(self))]
    async fn fetch(&self, key: &str) -> Result<String> {
        let url = self.parse_url(key)?;

        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| self.map_transport_error(key, e))?;

        let status = response.status();
        if !status.is_success() {
            warn!(key, status = status.as_u16(), "Fetch returned non-success status");
            return Err(TallyError::FetchStatus {
                key: key.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| self.map_transport_error(key, e))?;

        debug!(key, bytes = body.len(), "Fetched resource");
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher() -> HttpFetcher {
        HttpFetcher::with_config(HttpConfig::default().with_timeout_seconds(5)).unwrap()
    }

    #[test]
    fn test_parse_url() {
        let f = fetcher();
        assert!(f.parse_url("http://example.com/a?b=c").is_ok());
        assert!(f.parse_url("  https://example.com  ").is_ok());
        assert!(matches!(f.parse_url("example.com"), Err(TallyError::InvalidUrl(_))));
        assert!(matches!(f.parse_url("ftp://example.com"), Err(TallyError::InvalidUrl(_))));
    }

    #[test]
    fn test_default_config() {
        let config = HttpConfig::default();
        assert_eq!(config.timeout_seconds, 30);
        assert!(config.user_agent.starts_with("tally/"));
    }

    #[tokio::test]
    async fn test_fetch_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/page"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>hello</html>"))
            .expect(1)
            .mount(&server)
            .await;

        let body = fetcher()
            .fetch(&format!("{}/page", server.uri()))
            .await
            .unwrap();
        assert_eq!(body, "<html>hello</html>");
    }

    #[tokio::test]
    async fn test_fetch_non_success_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = fetcher()
            .fetch(&format!("{}/missing", server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, TallyError::FetchStatus { status: 404, .. }));
        assert!(err.is_fetch_error());
    }

    #[tokio::test]
    async fn test_fetch_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
            .mount(&server)
            .await;

        let slow = HttpFetcher::with_config(HttpConfig::default().with_timeout_seconds(1)).unwrap();
        let err = slow.fetch(&server.uri()).await.unwrap_err();
        assert!(matches!(err, TallyError::FetchTimeout { seconds: 1, .. }));
    }

    #[tokio::test]
    async fn test_fetch_connection_refused() {
        // Port 9 (discard) is closed on test machines.
        let err = fetcher().fetch("http://127.0.0.1:9/").await.unwrap_err();
        assert!(err.is_fetch_error());
    }

    #[tokio::test]
    async fn test_fetch_invalid_url() {
        let err = fetcher().fetch("not a url").await.unwrap_err();
        assert!(matches!(err, TallyError::InvalidUrl(_)));
    }
}

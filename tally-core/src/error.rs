//! Error types for Tally.
//!
//! A single error hierarchy built on `thiserror`. Fetch errors come from the
//! resource fetcher and are handed to the caller untouched; store errors mean
//! the key-value store could not serve a request.

use thiserror::Error;

/// Result type alias using `TallyError`.
pub type Result<T> = std::result::Result<T, TallyError>;

/// Main error type for all Tally operations.
#[derive(Debug, Error)]
pub enum TallyError {
    // ═══════════════════════════════════════════════════════════════════════════
    // FETCH ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Transport or protocol failure while fetching a resource.
    #[error("Fetch failed for '{key}': {reason}")]
    FetchFailed {
        /// Key that was being fetched
        key: String,
        /// Underlying transport error
        reason: String,
    },

    /// The resource answered with a non-success status.
    #[error("Fetch for '{key}' returned HTTP {status}")]
    FetchStatus {
        /// Key that was being fetched
        key: String,
        /// HTTP status code returned
        status: u16,
    },

    /// The fetch did not complete in time.
    #[error("Fetch for '{key}' timed out after {seconds}s")]
    FetchTimeout {
        /// Key that was being fetched
        key: String,
        /// Timeout that elapsed
        seconds: u64,
    },

    /// The key cannot be fetched as a URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    // ═══════════════════════════════════════════════════════════════════════════
    // STORE ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// The key-value store could not be reached.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// An increment hit a value that is not an integer.
    #[error("Store value at '{0}' is not an integer")]
    NotAnInteger(String),

    // ═══════════════════════════════════════════════════════════════════════════
    // VALIDATION ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Input validation failed.
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    // ═══════════════════════════════════════════════════════════════════════════
    // INTERNAL ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Internal invariant violation (should never happen).
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl TallyError {
    /// Returns true if the resource fetcher produced this error.
    pub fn is_fetch_error(&self) -> bool {
        matches!(
            self,
            TallyError::FetchFailed { .. }
                | TallyError::FetchStatus { .. }
                | TallyError::FetchTimeout { .. }
                | TallyError::InvalidUrl(_)
        )
    }

    /// Returns true if the key-value store produced this error.
    pub fn is_store_error(&self) -> bool {
        matches!(
            self,
            TallyError::StoreUnavailable(_) | TallyError::NotAnInteger(_)
        )
    }

    /// Returns true if this error is recoverable (can retry).
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            TallyError::FetchFailed { .. }
                | TallyError::FetchTimeout { .. }
                | TallyError::StoreUnavailable(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TallyError::FetchStatus {
            key: "http://example.com".into(),
            status: 503,
        };
        assert!(err.to_string().contains("http://example.com"));
        assert!(err.to_string().contains("503"));
    }

    #[test]
    fn test_error_classification() {
        let timeout = TallyError::FetchTimeout {
            key: "k".into(),
            seconds: 30,
        };
        assert!(timeout.is_fetch_error());
        assert!(timeout.is_recoverable());
        assert!(!timeout.is_store_error());

        let status = TallyError::FetchStatus {
            key: "k".into(),
            status: 404,
        };
        assert!(status.is_fetch_error());
        assert!(!status.is_recoverable());

        assert!(TallyError::StoreUnavailable("down".into()).is_store_error());
        assert!(TallyError::StoreUnavailable("down".into()).is_recoverable());
        assert!(TallyError::NotAnInteger("count:k".into()).is_store_error());
        assert!(!TallyError::NotAnInteger("count:k".into()).is_recoverable());

        assert!(!TallyError::ValidationError("empty".into()).is_fetch_error());
        assert!(!TallyError::ValidationError("empty".into()).is_store_error());
    }
}

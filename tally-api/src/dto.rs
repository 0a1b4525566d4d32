//! DTOs for API requests and responses.

use serde::{Deserialize, Serialize};

/// Query string carrying the resource key.
#[derive(Debug, Deserialize)]
pub struct KeyQuery {
    /// Resource key (usually a URL)
    pub key: Option<String>,
}

/// Response for the access count endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct CountResponse {
    /// The key as given
    pub key: String,
    /// Number of lookups so far
    pub count: u64,
}

/// Health check response.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always "ok"
    pub status: String,
    /// Store backend name
    pub store: String,
    /// Entry TTL in seconds
    pub ttl_seconds: u64,
    /// Server version
    pub version: String,
}

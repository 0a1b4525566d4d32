//! # Tally API Server
//!
//! HTTP front end for the Tally cached fetcher.
//!
//! ## Endpoints
//!
//! - `GET /health` - Liveness and store backend
//! - `GET /resource?key=<url>` - Cached fetch; `x-access-count` and `x-cache` headers
//! - `GET /api/v1/count?key=<url>` - Access count without counting
//!
//! ## Example
//!
//! ```rust,ignore
//! use tally_api::{ApiServer, ApiConfig};
//!
//! let server = ApiServer::from_config(ApiConfig::from_env()?).await?;
//! server.run(([0, 0, 0, 0], 3001)).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod dto;
mod error;
mod handlers;
mod routes;
mod state;

pub use error::ApiError;
pub use handlers::{ACCESS_COUNT_HEADER, CACHE_STATUS_HEADER};
pub use routes::create_router;
pub use state::{ApiConfig, AppState, PageCache, SharedFetcher, SharedStore};

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tally_core::error::Result;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

/// API server for Tally.
pub struct ApiServer {
    state: Arc<AppState>,
}

impl ApiServer {
    /// Creates a server around prepared state.
    pub fn new(state: AppState) -> Self {
        Self {
            state: Arc::new(state),
        }
    }

    /// Connects the configured store and builds the server.
    pub async fn from_config(config: ApiConfig) -> Result<Self> {
        Ok(Self::new(AppState::from_config(config).await?))
    }

    /// Creates the router with all routes configured.
    pub fn router(&self) -> Router {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
            .expose_headers(Any);

        create_router(self.state.clone())
            .layer(cors)
            .layer(TraceLayer::new_for_http())
    }

    /// Runs the server on the given address until Ctrl-C.
    pub async fn run(self, addr: impl Into<SocketAddr>) -> std::io::Result<()> {
        let addr = addr.into();
        let listener = tokio::net::TcpListener::bind(addr).await?;

        info!(
            store = self.state.cache.store().name(),
            ttl_seconds = self.state.cache.config().ttl_seconds,
            "Tally API server listening on {}",
            addr
        );

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await
    }
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutting down");
    }
}

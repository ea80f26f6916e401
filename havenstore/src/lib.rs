//! # havenstore
//!
//! Local object storage for the Haven marketplace: a self-hostable,
//! filesystem-backed stand-in for a cloud object-storage service. Uploaded
//! content (listing photos, documents, avatars) is persisted under a local
//! storage root partitioned into `public` and `private/<ownerId>` trees and
//! served back with a URL-shaped addressing scheme.
//!
//! ## Quick Start
//!
//! ```no_run
//! use havenstore::{Application, Config, config::Args, telemetry};
//! use clap::Parser;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     telemetry::init_telemetry()?;
//!
//!     let app = Application::new(config)?;
//!     app.serve(async {
//!         tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
//!     })
//!     .await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration
//!
//! See the [`config`] module for configuration options, including the
//! well-known `LOCAL_STORAGE_DIR`, `PUBLIC_STORAGE_DIR`, and
//! `STORAGE_BASE_URL` environment variables.

pub mod api;
pub mod config;
pub mod errors;
mod openapi;
pub mod storage;
pub mod telemetry;
mod types;

#[cfg(test)]
pub mod test_utils;

use crate::openapi::ApiDoc;
use crate::storage::LocalObjectStorage;
use anyhow::anyhow;
use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::{
    Router,
    routing::{get, post},
};
pub use config::Config;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, debug, info};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

pub use types::{OwnerId, UploadId};

/// Headroom on top of the payload limit for multipart framing overhead.
const UPLOAD_ENVELOPE_SLACK: usize = 16 * 1024;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub storage: Arc<LocalObjectStorage>,
}

/// Build the service router from application state.
pub fn build_router(state: &AppState) -> anyhow::Result<Router> {
    // Direct uploads get a body limit sized from config; every other route
    // keeps the axum default.
    let max_upload = state.config.storage.max_upload_size as usize;
    let upload_router = Router::new()
        .route("/upload/direct", post(api::handlers::uploads::direct_upload))
        .layer(DefaultBodyLimit::max(max_upload + UPLOAD_ENVELOPE_SLACK));

    let api_routes = Router::new()
        .route("/uploads", post(api::handlers::uploads::request_upload))
        .merge(upload_router)
        .with_state(state.clone());

    let object_routes = Router::new()
        .route("/{*path}", get(api::handlers::objects::serve_object))
        .with_state(state.clone());

    let public_asset_routes = Router::new()
        .route("/public-objects/{*path}", get(api::handlers::objects::serve_public_asset))
        .with_state(state.clone());

    let router = Router::new()
        .route("/healthz", get(|| async { "OK" }))
        .nest("/api", api_routes)
        .nest(&state.config.storage.base_url, object_routes)
        .merge(public_asset_routes)
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()));

    let router = router.layer(create_cors_layer(&state.config)?);

    Ok(router.layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    ))
}

/// Create CORS layer from config
fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if config.cors_allowed_origins.is_empty() {
        return Ok(layer);
    }

    let origins = config
        .cors_allowed_origins
        .iter()
        .map(|origin| {
            origin
                .parse::<HeaderValue>()
                .map_err(|e| anyhow!("Invalid CORS origin {origin:?}: {e}"))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    Ok(layer.allow_origin(AllowOrigin::list(origins)))
}

/// The storage service and its lifecycle.
///
/// 1. **Create**: [`Application::new`] resolves the storage layout on disk and
///    builds the router
/// 2. **Serve**: [`Application::serve`] binds to a TCP port and handles
///    requests until the shutdown future resolves
pub struct Application {
    router: Router,
    config: Config,
}

impl Application {
    /// Create a new application instance with the storage layout ensured.
    pub fn new(config: Config) -> anyhow::Result<Self> {
        debug!("Starting storage service with configuration: {:#?}", config);

        let storage = Arc::new(LocalObjectStorage::new(&config.storage)?);
        let state = AppState {
            config: config.clone(),
            storage,
        };
        let router = build_router(&state)?;

        Ok(Self { router, config })
    }

    /// Convert application into a test server (for tests)
    #[cfg(test)]
    pub fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::new(self.router).expect("Failed to create test server")
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            "Storage service listening on http://{}, serving objects under {}",
            bind_addr,
            self.config.storage.base_url
        );

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        Ok(())
    }
}

//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Build the shared, immutable application state
//! - Create the Axum router from the route table
//! - Wire up middleware (tracing, timeouts)
//! - Serve on a listener until shutdown is signalled

use axum::Router;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    timeout::{RequestBodyTimeoutLayer, TimeoutLayer},
    trace::TraceLayer,
};

use crate::assets::{AssetError, AssetStore, EmbeddedAssets};
use crate::config::DumpConfig;
use crate::http::response::SourcePage;
use crate::http::routes::build_routes;
use crate::render::{Presenter, RenderError};

/// Failures while preparing the server. All of them are fatal.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to initialize renderer: {0}")]
    Render(#[from] RenderError),

    #[error("failed to load assets: {0}")]
    Asset(#[from] AssetError),
}

/// Application state injected into handlers. Built once, never mutated.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<DumpConfig>,
    pub version: &'static str,
    pub assets: Arc<dyn AssetStore>,
    pub presenter: Arc<Presenter>,
    pub source: Arc<SourcePage>,
}

impl AppState {
    pub fn new(config: DumpConfig, assets: Arc<dyn AssetStore>) -> Result<Self, StartupError> {
        let presenter = Presenter::new(Arc::clone(&assets))?;
        let source = SourcePage::prepare(assets.as_ref(), &presenter)?;

        Ok(Self {
            config: Arc::new(config),
            version: crate::VERSION,
            assets,
            presenter: Arc::new(presenter),
            source: Arc::new(source),
        })
    }
}

/// HTTP server for the dump service.
pub struct HttpServer {
    router: Router,
    config: Arc<DumpConfig>,
}

impl HttpServer {
    /// Create a server backed by the embedded assets.
    pub fn new(config: DumpConfig) -> Result<Self, StartupError> {
        Self::with_assets(config, Arc::new(EmbeddedAssets::new()))
    }

    pub fn with_assets(config: DumpConfig, assets: Arc<dyn AssetStore>) -> Result<Self, StartupError> {
        let state = AppState::new(config, assets)?;
        let config = Arc::clone(&state.config);
        let router = Self::build_router(state);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(state: AppState) -> Router {
        let timeouts = state.config.timeouts.clone();
        let compression = state.config.compression.clone();

        build_routes(&compression)
            .with_state(state)
            .layer(RequestBodyTimeoutLayer::new(timeouts.read()))
            .layer(TimeoutLayer::new(timeouts.write()))
            .layer(TraceLayer::new_for_http())
    }

    /// The fully layered router, for driving requests without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires, then drain open connections.
    pub async fn run(self, listener: TcpListener, mut shutdown: broadcast::Receiver<()>) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &DumpConfig {
        &self.config
    }
}

//! Application startup and lifecycle management.
//!
//! Builds the application context, kicks off the model preload, and serves
//! the job endpoint plus health and metrics over HTTP.

use crate::config::{ModelBackend, WorkerConfig};
use crate::context::AppContext;
use crate::handlers::health::{health_check, metrics_handler, not_found, readiness_check};
use crate::handlers::runsync::run_sync;
use crate::services::providers::http::{HttpModelConfig, HttpModelLoader};
use crate::services::providers::mock::MockModelLoader;
use crate::services::providers::ModelLoader;
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::request_id_middleware;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::trace::TraceLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: WorkerConfig,
    pub context: Arc<AppContext>,
}

/// Build the router for the given state.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/runsync", post(run_sync))
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .route("/metrics", get(metrics_handler))
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(request_id_middleware))
        .with_state(state)
}

/// Pick the model provider named in the configuration.
pub fn build_loader(config: &WorkerConfig) -> Result<Arc<dyn ModelLoader>, AppError> {
    let loader: Arc<dyn ModelLoader> = match config.model.backend {
        ModelBackend::Http => Arc::new(
            HttpModelLoader::new(HttpModelConfig {
                base_url: config.model.inference_url.clone(),
            })
            .map_err(|e| AppError::ConfigError(anyhow::anyhow!(e)))?,
        ),
        ModelBackend::Mock => Arc::new(MockModelLoader::new(true)),
    };

    tracing::info!(
        backend = %config.model.backend,
        model = %config.model.name,
        "Initialized model provider"
    );
    Ok(loader)
}

/// Application container for managing server lifecycle.
pub struct Application {
    http_port: u16,
    http_listener: TcpListener,
    state: AppState,
}

impl Application {
    /// Build the application with the provider named in the configuration.
    pub async fn build(config: WorkerConfig) -> Result<Self, AppError> {
        let loader = build_loader(&config)?;
        Self::build_with_loader(config, loader).await
    }

    /// Build the application around an explicit model loader.
    pub async fn build_with_loader(
        config: WorkerConfig,
        loader: Arc<dyn ModelLoader>,
    ) -> Result<Self, AppError> {
        let context = Arc::new(AppContext::new(&config, loader));
        if config.model.preload {
            context.spawn_preload();
        }

        // Bind HTTP listener (port 0 = random port for testing)
        let http_addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let http_listener = TcpListener::bind(http_addr).await.map_err(|e| {
            tracing::error!("Failed to bind HTTP listener to {}: {}", http_addr, e);
            AppError::from(e)
        })?;
        let http_port = http_listener.local_addr()?.port();

        tracing::info!("TTS worker: HTTP on port {}", http_port);

        Ok(Self {
            http_port,
            http_listener,
            state: AppState { config, context },
        })
    }

    /// Get the HTTP port the server is listening on.
    pub fn http_port(&self) -> u16 {
        self.http_port
    }

    /// Get the shared application context.
    pub fn context(&self) -> Arc<AppContext> {
        Arc::clone(&self.state.context)
    }

    /// Run the application until a shutdown signal arrives.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        let app = router(self.state);

        axum::serve(self.http_listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| {
                tracing::error!("HTTP server error: {}", e);
                std::io::Error::other(format!("HTTP server error: {}", e))
            })
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

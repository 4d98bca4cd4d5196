//! Application startup and lifecycle management.

use crate::config::MemeConfig;
use crate::handlers::{
    generate_meme, get_sentiment, health_check, image_info, metrics, readiness_check,
    redo_generation,
};
use crate::services::providers::openai::OpenAiGateway;
use crate::services::MemeOrchestrator;
use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::request_id_middleware;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::trace::TraceLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: MemeOrchestrator,
}

impl AppState {
    pub fn new(orchestrator: MemeOrchestrator) -> Self {
        Self { orchestrator }
    }
}

/// Routes plus the middleware stack. The mobile client calls every endpoint with a
/// trailing slash, so both spellings are routed.
pub fn build_router(state: AppState) -> Router {
    let body_limit = state.orchestrator.limits().max_upload_bytes;

    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .route("/metrics", get(metrics))
        .route("/generateMeme", get(generate_meme))
        .route("/generateMeme/", get(generate_meme))
        .route("/redoGeneration", post(redo_generation))
        .route("/redoGeneration/", post(redo_generation))
        .route("/getSentiment", get(get_sentiment))
        .route("/getSentiment/", get(get_sentiment))
        .route("/imageInfo", post(image_info))
        .route("/imageInfo/", post(image_info))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    state: AppState,
}

impl Application {
    /// Build the application with the OpenAI gateway behind both capabilities.
    pub async fn build(config: MemeConfig) -> Result<Self, AppError> {
        let gateway = Arc::new(OpenAiGateway::new(config.openai_config()));
        tracing::info!(
            image_model = %config.models.image_model,
            vision_model = %config.models.vision_model,
            text_model = %config.models.text_model,
            "Initialized OpenAI gateway"
        );

        let orchestrator = MemeOrchestrator::new(gateway.clone(), gateway, config.limits.clone());
        Self::with_state(&config, AppState::new(orchestrator)).await
    }

    /// Bind the listener for an already assembled state (port 0 = random port).
    pub async fn with_state(config: &MemeConfig, state: AppState) -> Result<Self, AppError> {
        let address = config.common.listen_address();
        let listener = TcpListener::bind(&address).await.map_err(|e| {
            tracing::error!("Failed to bind listener to {}: {}", address, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Meme service listening on port {}", port);

        Ok(Self {
            port,
            listener,
            state,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Serve until SIGINT/SIGTERM.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        let router = build_router(self.state);

        axum::serve(self.listener, router)
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
            Ok(mut sig) => {
                sig.recv().await;
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

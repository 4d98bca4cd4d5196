use meme_service::config::MemeConfig;
use meme_service::services::metrics::init_metrics;
use meme_service::startup::Application;
use service_core::observability::init_tracing;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let config = MemeConfig::load().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        std::io::Error::other(format!("Configuration error: {}", e))
    })?;

    // APP__OTLP_ENDPOINT takes precedence over OTLP_ENDPOINT
    let otlp_endpoint = if config.common.otlp_endpoint.is_empty() {
        std::env::var("OTLP_ENDPOINT").unwrap_or_default()
    } else {
        config.common.otlp_endpoint.clone()
    };
    init_tracing("meme-service", &config.common.log_level, &otlp_endpoint)
        .map_err(|e| std::io::Error::other(format!("Tracing init error: {}", e)))?;

    init_metrics();

    let application = Application::build(config).await.map_err(|e| {
        tracing::error!("Failed to build application: {}", e);
        std::io::Error::other(format!("Startup error: {}", e))
    })?;

    application.run_until_stopped().await
}

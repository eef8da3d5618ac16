//! Prediction Bot - OWCS match prediction chat bot
//!
//! Loads the preprocessor and classifiers once at startup, then answers
//! `predict`, `compare`, `models` and greeting commands from chat.

use predictor_lib::{
    health::HealthRegistry,
    observability::{BotMetrics, StructuredLogger},
    predictor::{ModelRegistry, PredictionEngine},
    CommandHandler, HandlerConfig,
};
use anyhow::Result;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod api;
mod chat;
mod config;

const BOT_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json().with_writer(std::io::stderr))
        .init();

    info!("Starting prediction-bot");

    // Load configuration
    let config = config::BotConfig::load()?;
    info!(
        bot_name = %config.bot_name,
        models_dir = %config.models_dir.display(),
        "Bot configured"
    );

    // Both components report unhealthy until loaded / connected
    let health_registry = HealthRegistry::new();

    // Load models once; failures are recorded, not fatal
    let registry = Arc::new(ModelRegistry::load(&config.model_paths()));
    let failed = registry.failures().count();
    health_registry.record_registry(&registry).await;

    // Initialize metrics
    let metrics = BotMetrics::new();
    metrics.set_models_loaded(registry.len() as i64, failed as i64);

    // Initialize structured logger
    let logger = StructuredLogger::new(&config.bot_name);
    logger.log_startup(BOT_VERSION, registry.len(), failed);

    let handler = CommandHandler::new(
        PredictionEngine::new(registry),
        HandlerConfig {
            command_prefix: config.command_prefix.clone(),
            default_model: config.default_model.clone(),
        },
        metrics.clone(),
        logger.clone(),
    );

    // Create shared application state
    let app_state = Arc::new(api::AppState::new(health_registry.clone(), metrics));

    // Start health and metrics server
    let api_handle = tokio::spawn(api::serve(config.api_port, app_state));

    // Mark bot as ready after initialization
    health_registry.set_ready(true).await;

    let mut transport = chat::ConsoleTransport::stdio(config.bot_name.clone());
    let reason = tokio::select! {
        result = chat::run(&mut transport, &handler, &health_registry) => match result {
            Ok(replies) => {
                info!(replies, "Chat transport closed");
                "chat transport closed"
            }
            Err(e) => {
                error!(error = %e, "Chat transport failed");
                "chat transport failed"
            }
        },
        _ = tokio::signal::ctrl_c() => "SIGINT received",
    };

    health_registry.set_ready(false).await;
    logger.log_shutdown(reason);
    api_handle.abort();
    info!("Shutting down");

    Ok(())
}

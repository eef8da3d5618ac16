//! Observability infrastructure for the prediction bot
//!
//! Provides:
//! - Prometheus metrics (prediction latency, served predictions, errors, loaded models)
//! - Structured JSON logging with tracing

use crate::models::{ComparisonResult, PredictionResult};
use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, register_int_gauge,
    Encoder, Histogram, IntCounter, IntCounterVec, IntGauge, TextEncoder,
};
use std::sync::OnceLock;
use tracing::{info, warn};

/// Default histogram buckets for latency measurements (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.0001, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<BotMetricsInner> = OnceLock::new();

/// Inner metrics structure that holds the actual Prometheus metrics
struct BotMetricsInner {
    prediction_latency_seconds: Histogram,
    commands_received: IntCounter,
    predictions_served: IntCounterVec,
    command_errors: IntCounterVec,
    models_loaded: IntGauge,
    model_load_failures: IntGauge,
}

impl BotMetricsInner {
    fn new() -> Self {
        Self {
            prediction_latency_seconds: register_histogram!(
                "prediction_bot_prediction_latency_seconds",
                "Time spent encoding features and running classifiers",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register prediction_latency_seconds"),

            commands_received: register_int_counter!(
                "prediction_bot_commands_received_total",
                "Chat commands recognised by the dispatcher"
            )
            .expect("Failed to register commands_received"),

            predictions_served: register_int_counter_vec!(
                "prediction_bot_predictions_served_total",
                "Predictions returned to chat, by model",
                &["model"]
            )
            .expect("Failed to register predictions_served"),

            command_errors: register_int_counter_vec!(
                "prediction_bot_command_errors_total",
                "Commands answered with an error reply, by error kind",
                &["kind"]
            )
            .expect("Failed to register command_errors"),

            models_loaded: register_int_gauge!(
                "prediction_bot_models_loaded",
                "Number of model artifacts loaded at startup"
            )
            .expect("Failed to register models_loaded"),

            model_load_failures: register_int_gauge!(
                "prediction_bot_model_load_failures",
                "Number of configured model artifacts that failed to load"
            )
            .expect("Failed to register model_load_failures"),
        }
    }
}

/// Bot metrics for Prometheus exposition
///
/// This is a lightweight handle to the global metrics instance.
/// Multiple clones share the same underlying metrics.
#[derive(Clone)]
pub struct BotMetrics {
    _private: (),
}

impl Default for BotMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for BotMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("BotMetrics")
    }
}

impl BotMetrics {
    /// Create a new metrics handle (initializes global metrics if needed)
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(BotMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &BotMetricsInner {
        GLOBAL_METRICS.get().expect("Metrics not initialized")
    }

    pub fn observe_prediction_latency(&self, duration_secs: f64) {
        self.inner().prediction_latency_seconds.observe(duration_secs);
    }

    pub fn inc_commands_received(&self) {
        self.inner().commands_received.inc();
    }

    pub fn inc_predictions_served(&self, model: &str) {
        self.inner().predictions_served.with_label_values(&[model]).inc();
    }

    /// Count an error reply; `kind` is one of format, model_not_found, encoding, inference
    pub fn inc_command_errors(&self, kind: &str) {
        self.inner().command_errors.with_label_values(&[kind]).inc();
    }

    pub fn set_models_loaded(&self, loaded: i64, failed: i64) {
        self.inner().models_loaded.set(loaded);
        self.inner().model_load_failures.set(failed);
    }

    /// Prometheus text exposition of every registered metric
    pub fn render(&self) -> prometheus::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&prometheus::gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

/// Structured logger for bot events
///
/// Provides consistent JSON-formatted logging for predictions,
/// rejected commands and lifecycle events.
#[derive(Clone, Debug)]
pub struct StructuredLogger {
    bot_name: String,
}

impl StructuredLogger {
    pub fn new(bot_name: impl Into<String>) -> Self {
        Self {
            bot_name: bot_name.into(),
        }
    }

    /// Log a served single-model prediction
    pub fn log_prediction(&self, result: &PredictionResult, map: &str, latency_secs: f64) {
        info!(
            event = "prediction_served",
            bot = %self.bot_name,
            model = %result.model_name,
            team_a = %result.team_a,
            team_b = %result.team_b,
            map = %map,
            probability_team_a = result.probability_team_a,
            winner = %result.winner,
            confidence = result.confidence,
            latency_ms = latency_secs * 1000.0,
            "Served prediction"
        );
    }

    /// Log a served multi-model comparison
    pub fn log_comparison(&self, result: &ComparisonResult, map: &str, latency_secs: f64) {
        info!(
            event = "comparison_served",
            bot = %self.bot_name,
            team_a = %result.team_a,
            team_b = %result.team_b,
            map = %map,
            models = result.picks.len(),
            std_dev = result.std_dev,
            agreement = %result.agreement,
            latency_ms = latency_secs * 1000.0,
            "Served model comparison"
        );
    }

    /// Log a command answered with an error reply
    pub fn log_command_rejected(&self, command: &str, kind: &str, reason: &str) {
        warn!(
            event = "command_rejected",
            bot = %self.bot_name,
            command = %command,
            kind = %kind,
            reason = %reason,
            "Command rejected"
        );
    }

    /// Log bot startup
    pub fn log_startup(&self, version: &str, models_loaded: usize, models_failed: usize) {
        if models_failed == 0 {
            info!(
                event = "bot_started",
                bot = %self.bot_name,
                bot_version = %version,
                models_loaded = models_loaded,
                "Prediction bot started"
            );
        } else {
            warn!(
                event = "bot_started",
                bot = %self.bot_name,
                bot_version = %version,
                models_loaded = models_loaded,
                models_failed = models_failed,
                "Prediction bot started with missing models"
            );
        }
    }

    /// Log bot shutdown
    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "bot_shutdown",
            bot = %self.bot_name,
            reason = %reason,
            "Prediction bot shutting down"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bot_metrics_creation() {
        let metrics = BotMetrics::new();

        metrics.observe_prediction_latency(0.002);
        metrics.inc_commands_received();
        metrics.inc_predictions_served("ensemble");
        metrics.inc_command_errors("format");
        metrics.set_models_loaded(5, 0);

        // A second handle shares the registered metrics
        let again = BotMetrics::new();
        again.inc_predictions_served("ensemble");
    }

    #[test]
    fn test_render_exposes_bot_metrics() {
        let metrics = BotMetrics::new();
        metrics.inc_predictions_served("extra_trees");
        metrics.set_models_loaded(4, 1);

        let text = metrics.render().unwrap();
        assert!(
            text.contains("prediction_bot_predictions_served_total{model=\"extra_trees\"}"),
            "{text}"
        );
        assert!(text.contains("prediction_bot_model_load_failures"), "{text}");
    }

    #[test]
    fn test_structured_logger_creation() {
        let logger = StructuredLogger::new("owcs-bot");
        assert_eq!(logger.bot_name, "owcs-bot");
    }
}

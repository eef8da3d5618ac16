//! Chat command dispatch
//!
//! Recognises the bot's commands in incoming chat text, runs them through
//! the parser, engine and formatter, and turns every failure into a reply.

use crate::command::parse_with_default;
use crate::error::{FormatError, PredictError};
use crate::models::{FeatureRecord, DEFAULT_MODEL};
use crate::observability::{BotMetrics, StructuredLogger};
use crate::predictor::{PredictionEngine, ResponseFormatter};
use std::time::Instant;

/// Commands understood by the bot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatCommand<'a> {
    /// `predict team_1, team_2, map, ban_1, ban_2[, model]`
    Predict(&'a str),
    /// `compare team_1, team_2, map, ban_1, ban_2`
    Compare(&'a str),
    /// `models` or `modellist`
    Models,
    /// `hi`, `hello`, `howdy` or `hey`
    Hello,
}

impl<'a> ChatCommand<'a> {
    /// Split a chat message into a command and its argument string
    pub fn parse(prefix: &str, text: &'a str) -> Option<Self> {
        let body = text.trim_start().strip_prefix(prefix)?;
        let (name, args) = match body.split_once(char::is_whitespace) {
            Some((name, args)) => (name, args.trim()),
            None => (body, ""),
        };

        match name.to_ascii_lowercase().as_str() {
            "predict" => Some(ChatCommand::Predict(args)),
            "compare" => Some(ChatCommand::Compare(args)),
            "models" | "modellist" => Some(ChatCommand::Models),
            "hi" | "hello" | "howdy" | "hey" => Some(ChatCommand::Hello),
            _ => None,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            ChatCommand::Predict(_) => "predict",
            ChatCommand::Compare(_) => "compare",
            ChatCommand::Models => "models",
            ChatCommand::Hello => "hi",
        }
    }
}

/// Dispatcher settings
#[derive(Debug, Clone)]
pub struct HandlerConfig {
    pub command_prefix: String,
    pub default_model: String,
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            command_prefix: "!".to_string(),
            default_model: DEFAULT_MODEL.to_string(),
        }
    }
}

/// Answers chat commands from a prediction engine
#[derive(Debug, Clone)]
pub struct CommandHandler {
    engine: PredictionEngine,
    formatter: ResponseFormatter,
    config: HandlerConfig,
    metrics: BotMetrics,
    logger: StructuredLogger,
}

impl CommandHandler {
    pub fn new(
        engine: PredictionEngine,
        config: HandlerConfig,
        metrics: BotMetrics,
        logger: StructuredLogger,
    ) -> Self {
        Self {
            engine,
            formatter: ResponseFormatter::with_prefix(config.command_prefix.clone()),
            config,
            metrics,
            logger,
        }
    }

    pub fn engine(&self) -> &PredictionEngine {
        &self.engine
    }

    /// Reply to one chat message, or `None` if it is not a bot command
    pub fn handle(&self, message: &str) -> Option<String> {
        let command = ChatCommand::parse(&self.config.command_prefix, message)?;
        self.metrics.inc_commands_received();

        let reply = match command {
            ChatCommand::Predict(args) => self.predict(args),
            ChatCommand::Compare(args) => self.compare(args),
            ChatCommand::Models => Ok(self
                .formatter
                .model_list(self.engine.registry().classifier_names())),
            ChatCommand::Hello => Ok(self.formatter.greeting()),
        };

        Some(reply.unwrap_or_else(|rejection| {
            self.metrics.inc_command_errors(rejection.kind);
            self.logger
                .log_command_rejected(command.name(), rejection.kind, &rejection.reason);
            rejection.reply
        }))
    }

    fn predict(&self, args: &str) -> Result<String, Rejection> {
        let query = parse_with_default(args, &self.config.default_model)
            .map_err(|e| self.format_rejection(e, self.formatter.predict_usage()))?;
        let record = self.engine.feature_record(&query);

        let start = Instant::now();
        let result = self
            .engine
            .predict(&record, &query.model_name)
            .map_err(|e| self.predict_rejection(e))?;
        let elapsed = start.elapsed().as_secs_f64();

        self.metrics.observe_prediction_latency(elapsed);
        self.metrics.inc_predictions_served(&result.model_name);
        self.logger.log_prediction(&result, &record.map_name, elapsed);

        Ok(self.formatter.prediction(&result, &record))
    }

    fn compare(&self, args: &str) -> Result<String, Rejection> {
        let field_count = args.split(',').count();
        if field_count > 5 {
            return Err(self.format_rejection(
                FormatError::FieldCount(field_count),
                self.formatter.compare_usage(),
            ));
        }

        let query = parse_with_default(args, &self.config.default_model)
            .map_err(|e| self.format_rejection(e, self.formatter.compare_usage()))?;
        let record: FeatureRecord = self.engine.feature_record(&query);

        let start = Instant::now();
        let result = self
            .engine
            .compare(&record)
            .map_err(|e| self.predict_rejection(e))?;
        let elapsed = start.elapsed().as_secs_f64();

        self.metrics.observe_prediction_latency(elapsed);
        for pick in &result.picks {
            self.metrics.inc_predictions_served(&pick.model_name);
        }
        self.logger.log_comparison(&result, &record.map_name, elapsed);

        Ok(self.formatter.comparison(&result, &record))
    }

    fn format_rejection(&self, error: FormatError, usage: String) -> Rejection {
        Rejection {
            kind: "format",
            reason: error.to_string(),
            reply: usage,
        }
    }

    fn predict_rejection(&self, error: PredictError) -> Rejection {
        let (kind, reply) = match &error {
            PredictError::ModelNotFound(name) => {
                ("model_not_found", self.formatter.model_not_found(name))
            }
            PredictError::NotAClassifier(_) | PredictError::NoClassifiers => {
                ("model_not_found", self.formatter.prediction_error(&error))
            }
            PredictError::Encoding(_) => ("encoding", self.formatter.prediction_error(&error)),
            PredictError::Inference { .. } => {
                ("inference", self.formatter.prediction_error(&error))
            }
        };
        Rejection {
            kind,
            reason: error.to_string(),
            reply,
        }
    }
}

/// An error reply together with what to record about it
struct Rejection {
    kind: &'static str,
    reason: String,
    reply: String,
}

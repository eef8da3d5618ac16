//! Prediction library for the OWCS match prediction bot
//!
//! This crate provides the core functionality for:
//! - Parsing `predict`/`compare` chat arguments into match queries
//! - Loading the preprocessor and ONNX classifiers into a model registry
//! - Serving win probabilities, winners and model agreement
//! - Formatting chat replies
//! - Health checks and observability

pub mod command;
pub mod dispatch;
pub mod error;
pub mod health;
pub mod models;
pub mod observability;
pub mod predictor;

pub use dispatch::{ChatCommand, CommandHandler, HandlerConfig};
pub use error::{EncodingError, FormatError, LoadError, PredictError};
pub use health::{
    Component, ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse,
    ReadinessResponse,
};
pub use models::*;
pub use observability::{BotMetrics, StructuredLogger};

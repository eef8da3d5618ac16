//! Error types for each stage of the prediction pipeline

use std::path::PathBuf;
use thiserror::Error;

/// The chat argument string has the wrong shape
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("no arguments provided")]
    Empty,

    #[error("expected 5 or 6 comma-separated fields, got {0}")]
    FieldCount(usize),

    #[error("field `{0}` must not be empty")]
    EmptyField(&'static str),
}

/// Input values the fitted preprocessing transform cannot encode
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodingError {
    #[error("Found unknown category '{value}' in column '{column}'")]
    UnknownCategory { column: String, value: String },

    #[error("Preprocessor expects column '{0}' which the feature record does not have")]
    MissingColumn(String),
}

/// Failures while producing a prediction
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PredictError {
    #[error("Model '{0}' not found")]
    ModelNotFound(String),

    #[error("Model '{0}' is not a classifier")]
    NotAClassifier(String),

    #[error("No classifiers loaded")]
    NoClassifiers,

    #[error(transparent)]
    Encoding(#[from] EncodingError),

    #[error("Inference failed for model '{model}': {message}")]
    Inference { model: String, message: String },
}

/// A single registry entry that could not be loaded
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Model file not found: {0:?}")]
    NotFound(PathBuf),

    #[error("Failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid preprocessor definition: {0}")]
    Preprocessor(String),

    #[error("Failed to load ONNX model: {0}")]
    Onnx(String),
}

pub type ParseResult<T> = std::result::Result<T, FormatError>;
pub type EncodeResult<T> = std::result::Result<T, EncodingError>;
pub type PredictResult<T> = std::result::Result<T, PredictError>;

//! ML prediction engine

mod engine;
mod features;
mod inference;
mod output;
mod preprocess;
mod registry;

pub use engine::{pick_winner, population_std_dev, PredictionEngine};
pub use features::FeatureEncoder;
pub use inference::OnnxClassifier;
pub use output::{format_percent, ResponseFormatter};
pub use preprocess::{CategoricalColumn, OneHotPreprocessor, UnknownPolicy};
pub use registry::{
    default_model_paths, ArtifactKind, LoadOutcome, LoadReport, ModelArtifact, ModelRegistry,
};

use crate::error::{EncodeResult, PredictResult};
use crate::models::{EncodedFeatures, FeatureRecord};

/// Fitted transform from a categorical record to model input
pub trait Preprocessor: Send + Sync {
    /// Encode one record into a single feature row
    fn transform(&self, record: &FeatureRecord) -> EncodeResult<EncodedFeatures>;

    /// Width of the rows produced by `transform`, if known up front
    fn output_width(&self) -> Option<usize>;
}

/// Fitted binary classifier
pub trait Classifier: Send + Sync {
    /// Per-row `[P(class 0), P(class 1)]` for the given features
    fn predict_proba(&self, features: &EncodedFeatures) -> PredictResult<Vec<[f64; 2]>>;
}

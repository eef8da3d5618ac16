//! ONNX classifier inference using tract
//!
//! Classifiers are exported from the training step as ONNX graphs with a
//! single float input row and a `[N, 2]` probability output (for sklearn
//! exports this means `zipmap=False`).

use super::Classifier;
use crate::error::{LoadError, PredictError, PredictResult};
use crate::models::EncodedFeatures;
use anyhow::Context;
use std::time::Instant;
use tract_onnx::prelude::*;
use tracing::{debug, warn};

/// Number of classes in a win/loss classifier
const NUM_CLASSES: usize = 2;

/// Inference latency above which a warning is logged
const MAX_INFERENCE_MS: u128 = 50;

type TractModel = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// Binary classifier backed by an optimized tract plan
#[derive(Debug)]
pub struct OnnxClassifier {
    name: String,
    model: TractModel,
    input_width: Option<usize>,
}

impl OnnxClassifier {
    /// Build a classifier from ONNX bytes
    ///
    /// When `input_width` is known (from the preprocessor) the input is pinned
    /// to `[1, input_width]` before optimization.
    pub fn from_bytes(
        name: impl Into<String>,
        model_bytes: &[u8],
        input_width: Option<usize>,
    ) -> Result<Self, LoadError> {
        let model =
            Self::load_model(model_bytes, input_width).map_err(|e| LoadError::Onnx(format!("{e:#}")))?;
        Ok(Self {
            name: name.into(),
            model,
            input_width,
        })
    }

    fn load_model(model_bytes: &[u8], input_width: Option<usize>) -> anyhow::Result<TractModel> {
        let mut model = tract_onnx::onnx()
            .model_for_read(&mut std::io::Cursor::new(model_bytes))
            .context("Failed to parse ONNX model")?;

        if let Some(width) = input_width {
            model = model
                .with_input_fact(0, f32::fact([1, width]).into())
                .context("Failed to set input shape")?;
        }

        let plan = model
            .into_optimized()
            .context("Failed to optimize model")?
            .into_runnable()
            .context("Failed to create runnable model")?;
        Ok(plan)
    }

    fn inference_error(&self, message: impl Into<String>) -> PredictError {
        PredictError::Inference {
            model: self.name.clone(),
            message: message.into(),
        }
    }

    fn features_to_tensor(&self, features: &EncodedFeatures) -> PredictResult<Tensor> {
        if let Some(width) = self.input_width {
            if features.width() != width {
                return Err(self.inference_error(format!(
                    "expected {} features, got {}",
                    width,
                    features.width()
                )));
            }
        }

        tract_ndarray::Array2::from_shape_vec((1, features.width()), features.values.clone())
            .map(Tensor::from)
            .map_err(|e| self.inference_error(e.to_string()))
    }

    /// Pick the `[rows, 2]` float output among the graph outputs
    fn probabilities(&self, outputs: &TVec<TValue>) -> PredictResult<Vec<[f64; 2]>> {
        let output = outputs
            .iter()
            .find(|o| {
                o.datum_type() == f32::datum_type() && o.shape().last() == Some(&NUM_CLASSES)
            })
            .ok_or_else(|| self.inference_error("no [N, 2] probability output"))?;

        let view = output
            .to_array_view::<f32>()
            .map_err(|e| self.inference_error(e.to_string()))?;
        let values: Vec<f32> = view.iter().copied().collect();

        Ok(values
            .chunks_exact(NUM_CLASSES)
            .map(|row| [row[0] as f64, row[1] as f64])
            .collect())
    }
}

impl Classifier for OnnxClassifier {
    fn predict_proba(&self, features: &EncodedFeatures) -> PredictResult<Vec<[f64; 2]>> {
        let start = Instant::now();
        let input = self.features_to_tensor(features)?;

        let outputs = self
            .model
            .run(tvec!(input.into()))
            .map_err(|e| self.inference_error(format!("{e:#}")))?;
        let rows = self.probabilities(&outputs)?;

        let elapsed = start.elapsed();

        if elapsed.as_millis() > MAX_INFERENCE_MS {
            warn!(
                model = %self.name,
                elapsed_ms = elapsed.as_millis(),
                "Inference exceeded {}ms target",
                MAX_INFERENCE_MS
            );
        } else {
            debug!(model = %self.name, elapsed_us = elapsed.as_micros(), "Inference completed");
        }

        Ok(rows)
    }
}

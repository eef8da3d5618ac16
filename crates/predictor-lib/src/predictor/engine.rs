//! Prediction engine
//!
//! Runs a feature record through the registry's preprocessing transform and
//! one or all classifiers, and turns the team_a win probability into a
//! winner and a confidence.

use super::features::FeatureEncoder;
use super::registry::ModelRegistry;
use crate::error::{PredictError, PredictResult};
use crate::models::{
    Agreement, ComparisonResult, EncodedFeatures, FeatureRecord, MatchQuery, PredictionResult,
};
use std::sync::Arc;
use tracing::debug;

/// Serves predictions from an immutable model registry
#[derive(Debug, Clone)]
pub struct PredictionEngine {
    registry: Arc<ModelRegistry>,
    encoder: FeatureEncoder,
}

impl PredictionEngine {
    pub fn new(registry: Arc<ModelRegistry>) -> Self {
        Self {
            registry,
            encoder: FeatureEncoder::new(),
        }
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    /// Shape a parsed query into the preprocessor's input record
    pub fn feature_record(&self, query: &MatchQuery) -> FeatureRecord {
        self.encoder.encode(query)
    }

    /// Apply the fitted preprocessing transform to a record
    pub fn encode(&self, record: &FeatureRecord) -> PredictResult<EncodedFeatures> {
        let preprocessor = self.registry.preprocessor()?;
        Ok(preprocessor.transform(record)?)
    }

    /// Predict with the model named in the query
    pub fn predict_query(&self, query: &MatchQuery) -> PredictResult<PredictionResult> {
        let record = self.feature_record(query);
        self.predict(&record, &query.model_name)
    }

    /// Predict a single match with one named classifier
    pub fn predict(&self, record: &FeatureRecord, model_name: &str) -> PredictResult<PredictionResult> {
        let features = self.encode(record)?;
        let probability = self.win_probability(model_name, &features)?;
        Ok(build_result(record, model_name, probability))
    }

    /// Predict a single match with every loaded classifier
    pub fn compare(&self, record: &FeatureRecord) -> PredictResult<ComparisonResult> {
        let features = self.encode(record)?;

        let names = self.registry.classifier_names();
        if names.is_empty() {
            return Err(PredictError::NoClassifiers);
        }

        let picks = names
            .into_iter()
            .map(|name| {
                let probability = self.win_probability(name, &features)?;
                Ok(build_result(record, name, probability))
            })
            .collect::<PredictResult<Vec<_>>>()?;

        let probabilities: Vec<f64> = picks.iter().map(|p| p.probability_team_a).collect();
        let std_dev = population_std_dev(&probabilities);

        Ok(ComparisonResult {
            team_a: record.team_name.clone(),
            team_b: record.team_name_opp.clone(),
            picks,
            std_dev,
            agreement: Agreement::from_std_dev(std_dev),
        })
    }

    /// Probability of class 1 (team_a wins) for the single encoded row
    fn win_probability(&self, model_name: &str, features: &EncodedFeatures) -> PredictResult<f64> {
        let classifier = self.registry.classifier(model_name)?;
        let rows = classifier.predict_proba(features)?;

        let probability = rows
            .first()
            .map(|row| row[1])
            .ok_or_else(|| PredictError::Inference {
                model: model_name.to_string(),
                message: "model returned no rows".to_string(),
            })?;

        if !(0.0..=1.0).contains(&probability) {
            return Err(PredictError::Inference {
                model: model_name.to_string(),
                message: format!("probability {} outside [0, 1]", probability),
            });
        }

        debug!(model = %model_name, probability, "Computed win probability");
        Ok(probability)
    }
}

fn build_result(record: &FeatureRecord, model_name: &str, probability: f64) -> PredictionResult {
    let (winner, confidence) = pick_winner(&record.team_name, &record.team_name_opp, probability);
    PredictionResult {
        model_name: model_name.to_string(),
        team_a: record.team_name.clone(),
        team_b: record.team_name_opp.clone(),
        probability_team_a: probability,
        winner: winner.to_string(),
        confidence,
    }
}

/// Winner and its probability mass for a team_a win probability
///
/// team_a only wins on a strictly greater-than-even probability, so an
/// exact 0.5 goes to team_b.
pub fn pick_winner<'a>(team_a: &'a str, team_b: &'a str, probability: f64) -> (&'a str, f64) {
    let winner = if probability > 0.5 { team_a } else { team_b };
    (winner, probability.max(1.0 - probability))
}

/// Population standard deviation (divides by n)
pub fn population_std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    variance.sqrt()
}

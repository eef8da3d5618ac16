//! Core data models for the prediction bot

use serde::{Deserialize, Serialize};
use std::fmt;

/// Model used when a command does not name one
pub const DEFAULT_MODEL: &str = "ensemble";

/// Registry name of the fitted preprocessing transform
pub const PREPROCESSOR_NAME: &str = "preprocessor";

/// Category the preprocessor was trained with for an empty ban slot
pub const NO_BAN: &str = "No Ban";

/// Registry key for a model name
///
/// Model names are case-insensitive: config keys, chat tokens and the
/// default model all resolve through this lowercase form.
pub fn canonical_model_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// A parsed prediction request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchQuery {
    pub team_a: String,
    pub team_b: String,
    pub map: String,
    pub ban_a: String,
    pub ban_b: String,
    pub model_name: String,
}

/// Single-row categorical input for the preprocessing transform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureRecord {
    pub team_name: String,
    pub team_name_opp: String,
    pub map_name: String,
    pub banned_hero: String,
    pub banned_hero_opp: String,
}

impl FeatureRecord {
    /// Column names in the order the preprocessor was fit on
    pub const COLUMNS: [&'static str; 5] = [
        "team_name",
        "team_name_opp",
        "map_name",
        "banned_hero",
        "banned_hero_opp",
    ];

    /// Value of a named column
    pub fn get(&self, column: &str) -> Option<&str> {
        match column {
            "team_name" => Some(&self.team_name),
            "team_name_opp" => Some(&self.team_name_opp),
            "map_name" => Some(&self.map_name),
            "banned_hero" => Some(&self.banned_hero),
            "banned_hero_opp" => Some(&self.banned_hero_opp),
            _ => None,
        }
    }

    /// Values in `COLUMNS` order
    pub fn values(&self) -> [&str; 5] {
        [
            &self.team_name,
            &self.team_name_opp,
            &self.map_name,
            &self.banned_hero,
            &self.banned_hero_opp,
        ]
    }
}

/// Numeric single-row output of the preprocessing transform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodedFeatures {
    pub values: Vec<f32>,
}

impl EncodedFeatures {
    pub fn new(values: Vec<f32>) -> Self {
        Self { values }
    }

    pub fn width(&self) -> usize {
        self.values.len()
    }
}

/// Outcome of running one classifier on one match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub model_name: String,
    pub team_a: String,
    pub team_b: String,
    /// Probability that `team_a` wins, in [0, 1]
    pub probability_team_a: f64,
    pub winner: String,
    /// Probability mass assigned to `winner`, in [0.5, 1]
    pub confidence: f64,
}

/// Outcome of running every loaded classifier on one match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub team_a: String,
    pub team_b: String,
    /// Per-model results, ordered by model name
    pub picks: Vec<PredictionResult>,
    /// Population standard deviation of the team_a probabilities
    pub std_dev: f64,
    pub agreement: Agreement,
}

/// How closely several models' probabilities cluster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Agreement {
    High,
    Medium,
    Low,
}

impl Agreement {
    /// Classify a standard deviation: below 0.05 is High, below 0.1 is Medium
    pub fn from_std_dev(std_dev: f64) -> Self {
        if std_dev < 0.05 {
            Agreement::High
        } else if std_dev < 0.1 {
            Agreement::Medium
        } else {
            Agreement::Low
        }
    }
}

impl fmt::Display for Agreement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Agreement::High => write!(f, "High"),
            Agreement::Medium => write!(f, "Medium"),
            Agreement::Low => write!(f, "Low"),
        }
    }
}

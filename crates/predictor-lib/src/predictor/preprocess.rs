//! One-hot preprocessing transform
//!
//! Loaded from a JSON description of the fitted encoder: the ordered input
//! columns, the categories seen for each column during training, and the
//! policy for categories that were never seen.

use super::Preprocessor;
use crate::error::{EncodeResult, EncodingError, LoadError};
use crate::models::{EncodedFeatures, FeatureRecord};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// What to do with a category the encoder was not fit on
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownPolicy {
    /// Reject the record
    #[default]
    Error,
    /// Encode the column as all zeros
    Ignore,
}

/// Known categories for one input column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoricalColumn {
    pub name: String,
    pub categories: Vec<String>,
}

/// Fitted one-hot encoder over the feature record columns
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OneHotPreprocessor {
    columns: Vec<CategoricalColumn>,
    #[serde(default)]
    handle_unknown: UnknownPolicy,
}

impl OneHotPreprocessor {
    pub fn new(columns: Vec<CategoricalColumn>, handle_unknown: UnknownPolicy) -> Result<Self, LoadError> {
        let encoder = Self { columns, handle_unknown };
        encoder.validate()?;
        Ok(encoder)
    }

    /// Parse and validate a JSON encoder description
    pub fn from_json(bytes: &[u8]) -> Result<Self, LoadError> {
        let encoder: Self = serde_json::from_slice(bytes)
            .map_err(|e| LoadError::Preprocessor(e.to_string()))?;
        encoder.validate()?;
        Ok(encoder)
    }

    pub fn columns(&self) -> &[CategoricalColumn] {
        &self.columns
    }

    pub fn handle_unknown(&self) -> UnknownPolicy {
        self.handle_unknown
    }

    fn validate(&self) -> Result<(), LoadError> {
        if self.columns.is_empty() {
            return Err(LoadError::Preprocessor("no columns defined".to_string()));
        }

        let mut seen_columns = HashSet::new();
        for column in &self.columns {
            if !FeatureRecord::COLUMNS.contains(&column.name.as_str()) {
                return Err(LoadError::Preprocessor(format!(
                    "unknown column '{}'",
                    column.name
                )));
            }
            if !seen_columns.insert(column.name.as_str()) {
                return Err(LoadError::Preprocessor(format!(
                    "column '{}' defined twice",
                    column.name
                )));
            }
            if column.categories.is_empty() {
                return Err(LoadError::Preprocessor(format!(
                    "column '{}' has no categories",
                    column.name
                )));
            }
        }
        Ok(())
    }
}

impl Preprocessor for OneHotPreprocessor {
    fn transform(&self, record: &FeatureRecord) -> EncodeResult<EncodedFeatures> {
        let mut values = Vec::with_capacity(self.columns.iter().map(|c| c.categories.len()).sum());

        for column in &self.columns {
            let value = record
                .get(&column.name)
                .ok_or_else(|| EncodingError::MissingColumn(column.name.clone()))?;

            let hot = column.categories.iter().position(|c| c == value);
            if hot.is_none() && self.handle_unknown == UnknownPolicy::Error {
                return Err(EncodingError::UnknownCategory {
                    column: column.name.clone(),
                    value: value.to_string(),
                });
            }

            values.extend((0..column.categories.len()).map(|i| {
                if Some(i) == hot {
                    1.0
                } else {
                    0.0
                }
            }));
        }

        Ok(EncodedFeatures::new(values))
    }

    fn output_width(&self) -> Option<usize> {
        Some(self.columns.iter().map(|c| c.categories.len()).sum())
    }
}

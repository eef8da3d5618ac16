//! CLI subcommands

pub mod models;
pub mod predict;

use anyhow::{anyhow, Result};
use clap::Args;
use predictor_lib::{canonical_model_name, FormatError, MatchQuery, PredictError, NO_BAN};
use predictor_lib::predictor::ModelRegistry;
use serde::{Deserialize, Serialize};

/// Teams, map and bans describing one match
#[derive(Debug, Clone, Args, Serialize, Deserialize)]
pub struct MatchArgs {
    /// First team (the probabilities are reported for this team)
    pub team_a: String,

    /// Second team
    pub team_b: String,

    /// Map name
    pub map: String,

    /// Hero banned by the first team
    #[arg(long)]
    #[serde(default)]
    pub ban_a: Option<String>,

    /// Hero banned by the second team
    #[arg(long)]
    #[serde(default)]
    pub ban_b: Option<String>,
}

impl MatchArgs {
    /// Build a query, applying the same rules as the chat parser
    pub fn to_query(&self, model_name: &str) -> Result<MatchQuery> {
        Ok(MatchQuery {
            team_a: required("team_1", &self.team_a)?,
            team_b: required("team_2", &self.team_b)?,
            map: required("map", &self.map)?,
            ban_a: ban_or_default(self.ban_a.as_deref()),
            ban_b: ban_or_default(self.ban_b.as_deref()),
            model_name: canonical_model_name(model_name),
        })
    }
}

fn required(field: &'static str, value: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(FormatError::EmptyField(field).into());
    }
    Ok(value.to_string())
}

fn ban_or_default(ban: Option<&str>) -> String {
    match ban.map(str::trim) {
        Some(ban) if !ban.is_empty() => ban.to_string(),
        _ => NO_BAN.to_string(),
    }
}

/// Attach the list of loaded models to a model lookup failure
pub fn explain(error: PredictError, registry: &ModelRegistry) -> anyhow::Error {
    match error {
        PredictError::ModelNotFound(_) | PredictError::NotAClassifier(_) => anyhow!(
            "{}. Available models: {}",
            error,
            registry.classifier_names().join(", ")
        ),
        other => other.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(ban_a: Option<&str>, ban_b: Option<&str>) -> MatchArgs {
        MatchArgs {
            team_a: " Team Falcons ".to_string(),
            team_b: "Virtus.Pro".to_string(),
            map: "King's Row".to_string(),
            ban_a: ban_a.map(String::from),
            ban_b: ban_b.map(String::from),
        }
    }

    #[test]
    fn test_to_query_trims_and_fills_bans() {
        let query = args(Some("Ana"), Some("  ")).to_query("ensemble").unwrap();
        assert_eq!(query.team_a, "Team Falcons");
        assert_eq!(query.ban_a, "Ana");
        assert_eq!(query.ban_b, NO_BAN);
        assert_eq!(query.model_name, "ensemble");

        let query = args(None, None).to_query("Random_Forest").unwrap();
        assert_eq!(query.model_name, "random_forest");
        assert_eq!(query.ban_a, NO_BAN);
        assert_eq!(query.ban_b, NO_BAN);
    }

    #[test]
    fn test_to_query_rejects_empty_team() {
        let mut bad = args(None, None);
        bad.team_b = "   ".to_string();
        assert!(bad.to_query("ensemble").is_err());
    }

    #[test]
    fn test_batch_case_deserializes_without_bans() {
        let case: MatchArgs =
            serde_json::from_str(r#"{"team_a": "NTMR", "team_b": "SSG", "map": "Ilios"}"#).unwrap();
        assert_eq!(case.ban_a, None);
        assert_eq!(case.to_query("ensemble").unwrap().ban_b, NO_BAN);
    }
}

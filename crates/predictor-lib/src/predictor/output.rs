//! Chat reply formatting for prediction results

use crate::models::{ComparisonResult, FeatureRecord, PredictionResult};

/// Format a [0, 1] value as a percentage with two decimals
pub fn format_percent(value: f64) -> String {
    format!("{:.2}%", value * 100.0)
}

/// Renders engine results into short chat messages
#[derive(Debug, Clone)]
pub struct ResponseFormatter {
    command_prefix: String,
}

impl ResponseFormatter {
    pub fn new() -> Self {
        Self::with_prefix("!")
    }

    pub fn with_prefix(command_prefix: impl Into<String>) -> Self {
        Self {
            command_prefix: command_prefix.into(),
        }
    }

    /// Single-model verdict with the map and ban context
    pub fn prediction(&self, result: &PredictionResult, record: &FeatureRecord) -> String {
        format!(
            "Prediction using {} model:\n\
             • {} is predicted to win ({} confidence)\n\
             • Map: {} | Bans: {} & {}",
            result.model_name,
            result.winner,
            format_percent(result.confidence),
            record.map_name,
            record.banned_hero,
            record.banned_hero_opp,
        )
    }

    /// Every model's pick followed by the agreement label
    pub fn comparison(&self, result: &ComparisonResult, record: &FeatureRecord) -> String {
        let mut lines = Vec::with_capacity(result.picks.len() + 2);
        lines.push(format!(
            "{} vs {} on {}",
            result.team_a, result.team_b, record.map_name
        ));
        for pick in &result.picks {
            lines.push(format!(
                "{}: {} wins ({} chance for {})",
                pick.model_name,
                pick.winner,
                format_percent(pick.probability_team_a),
                result.team_a,
            ));
        }
        lines.push(format!(
            "Model agreement: {} (σ={:.3})",
            result.agreement, result.std_dev
        ));
        lines.join("\n")
    }

    /// Reply to a greeting; the transport addresses it to the chatter
    pub fn greeting(&self) -> String {
        "Hello!".to_string()
    }

    /// Listing of loaded model names
    pub fn model_list<'a>(&self, names: impl IntoIterator<Item = &'a str>) -> String {
        let names: Vec<&str> = names.into_iter().collect();
        if names.is_empty() {
            "No models are loaded.".to_string()
        } else {
            format!("Available models: {}", names.join(", "))
        }
    }

    pub fn predict_usage(&self) -> String {
        format!(
            "Format error. Format: {}predict team_1, team_2, map, ban_team_1, ban_team_2, model(optional)",
            self.command_prefix
        )
    }

    pub fn compare_usage(&self) -> String {
        format!(
            "Format error. Format: {}compare team_1, team_2, map, ban_team_1, ban_team_2",
            self.command_prefix
        )
    }

    pub fn model_not_found(&self, name: &str) -> String {
        format!(
            "Model '{}' not found. Use {}models to see available models.",
            name, self.command_prefix
        )
    }

    pub fn prediction_error(&self, cause: &dyn std::fmt::Display) -> String {
        format!("Error making prediction: {}", cause)
    }
}

impl Default for ResponseFormatter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Agreement;

    fn record() -> FeatureRecord {
        FeatureRecord {
            team_name: "Team Falcons".to_string(),
            team_name_opp: "Virtus.Pro".to_string(),
            map_name: "King's Row".to_string(),
            banned_hero: "Ana".to_string(),
            banned_hero_opp: "Tracer".to_string(),
        }
    }

    fn result(model: &str, probability: f64, winner: &str) -> PredictionResult {
        PredictionResult {
            model_name: model.to_string(),
            team_a: "Team Falcons".to_string(),
            team_b: "Virtus.Pro".to_string(),
            probability_team_a: probability,
            winner: winner.to_string(),
            confidence: probability.max(1.0 - probability),
        }
    }

    #[test]
    fn test_format_percent() {
        assert_eq!(format_percent(0.7), "70.00%");
        assert_eq!(format_percent(0.5), "50.00%");
        assert_eq!(format_percent(1.0), "100.00%");
    }

    #[test]
    fn test_single_prediction_message() {
        let message = ResponseFormatter::new().prediction(&result("ensemble", 0.7, "Team Falcons"), &record());
        assert_eq!(
            message,
            "Prediction using ensemble model:\n\
             • Team Falcons is predicted to win (70.00% confidence)\n\
             • Map: King's Row | Bans: Ana & Tracer"
        );
    }

    #[test]
    fn test_comparison_message() {
        let comparison = ComparisonResult {
            team_a: "Team Falcons".to_string(),
            team_b: "Virtus.Pro".to_string(),
            picks: vec![
                result("ensemble", 0.64, "Team Falcons"),
                result("neural_network", 0.45, "Virtus.Pro"),
            ],
            std_dev: 0.095,
            agreement: Agreement::Medium,
        };
        let message = ResponseFormatter::new().comparison(&comparison, &record());
        let lines: Vec<&str> = message.lines().collect();
        assert_eq!(lines[0], "Team Falcons vs Virtus.Pro on King's Row");
        assert_eq!(lines[1], "ensemble: Team Falcons wins (64.00% chance for Team Falcons)");
        assert_eq!(lines[2], "neural_network: Virtus.Pro wins (45.00% chance for Team Falcons)");
        assert_eq!(lines[3], "Model agreement: Medium (σ=0.095)");
    }

    #[test]
    fn test_model_list() {
        let formatter = ResponseFormatter::new();
        assert_eq!(
            formatter.model_list(["ensemble", "random_forest"]),
            "Available models: ensemble, random_forest"
        );
        assert_eq!(formatter.model_list(Vec::<&str>::new()), "No models are loaded.");
    }

    #[test]
    fn test_custom_prefix_in_hints() {
        let formatter = ResponseFormatter::with_prefix("?");
        assert!(formatter.predict_usage().contains("?predict"));
        assert!(formatter.model_not_found("xgb").contains("?models"));
    }
}

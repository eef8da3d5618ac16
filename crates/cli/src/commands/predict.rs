//! Offline prediction commands

use anyhow::{Context, Result};
use predictor_lib::predictor::{format_percent, PredictionEngine, ResponseFormatter};
use predictor_lib::{ComparisonResult, PredictionResult, DEFAULT_MODEL};
use serde::Serialize;
use std::path::Path;
use tabled::Tabled;

use super::{explain, MatchArgs};
use crate::output::{
    color_agreement, color_confidence, print_info, print_json, print_success, print_warning,
    render_table, OutputFormat,
};

/// Row for per-model prediction tables
#[derive(Tabled)]
struct PickRow {
    #[tabled(rename = "Model")]
    model: String,
    #[tabled(rename = "Winner")]
    winner: String,
    #[tabled(rename = "Confidence")]
    confidence: String,
    #[tabled(rename = "P(team A)")]
    probability_team_a: String,
}

impl From<&PredictionResult> for PickRow {
    fn from(result: &PredictionResult) -> Self {
        Self {
            model: result.model_name.clone(),
            winner: result.winner.clone(),
            confidence: color_confidence(result.confidence),
            probability_team_a: format_percent(result.probability_team_a),
        }
    }
}

/// Row for batch summaries
#[derive(Tabled)]
struct BatchRow {
    #[tabled(rename = "Match")]
    matchup: String,
    #[tabled(rename = "Map")]
    map: String,
    #[tabled(rename = "Favourite")]
    favourite: String,
    #[tabled(rename = "Votes")]
    votes: String,
    #[tabled(rename = "Agreement")]
    agreement: String,
}

/// One batch case and its outcome
#[derive(Serialize)]
struct BatchOutcome {
    case: MatchArgs,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<ComparisonResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Predict one match with a single model
pub fn predict(
    engine: &PredictionEngine,
    args: &MatchArgs,
    model: &str,
    format: OutputFormat,
) -> Result<()> {
    let query = args.to_query(model)?;
    let record = engine.feature_record(&query);
    let result = engine
        .predict(&record, &query.model_name)
        .map_err(|e| explain(e, engine.registry()))?;

    match format {
        OutputFormat::Json => print_json(&result)?,
        OutputFormat::Table => {
            println!("{}", render_table(vec![PickRow::from(&result)]));
            println!();
            print_info("Chat reply:");
            println!("{}", ResponseFormatter::new().prediction(&result, &record));
        }
    }

    Ok(())
}

/// Run every classifier on one match
pub fn compare(engine: &PredictionEngine, args: &MatchArgs, format: OutputFormat) -> Result<()> {
    let query = args.to_query(DEFAULT_MODEL)?;
    let record = engine.feature_record(&query);
    let result = engine.compare(&record)?;

    match format {
        OutputFormat::Json => print_json(&result)?,
        OutputFormat::Table => {
            println!("{} vs {} on {}", result.team_a, result.team_b, record.map_name);
            println!("{}", render_table(result.picks.iter().map(PickRow::from).collect()));
            println!(
                "\nModel agreement: {} (σ={:.3})",
                color_agreement(result.agreement),
                result.std_dev
            );
        }
    }

    Ok(())
}

/// Compare every case in a JSON file of matches
pub fn batch(engine: &PredictionEngine, file: &Path, format: OutputFormat) -> Result<()> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let cases: Vec<MatchArgs> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse cases from {}", file.display()))?;

    let outcomes: Vec<BatchOutcome> = cases
        .into_iter()
        .map(|case| {
            let result = case
                .to_query(DEFAULT_MODEL)
                .and_then(|query| {
                    engine
                        .compare(&engine.feature_record(&query))
                        .map_err(Into::into)
                });
            match result {
                Ok(result) => BatchOutcome {
                    case,
                    result: Some(result),
                    error: None,
                },
                Err(e) => BatchOutcome {
                    case,
                    result: None,
                    error: Some(e.to_string()),
                },
            }
        })
        .collect();

    if let OutputFormat::Json = format {
        return print_json(&outcomes);
    }

    let failed = outcomes.iter().filter(|o| o.error.is_some()).count();
    let rows: Vec<BatchRow> = outcomes
        .iter()
        .filter_map(|outcome| {
            let result = outcome.result.as_ref()?;
            Some(batch_row(&outcome.case, result))
        })
        .collect();

    if !rows.is_empty() {
        println!("{}", render_table(rows));
    }
    for outcome in &outcomes {
        if let Some(error) = &outcome.error {
            print_warning(&format!(
                "{} vs {} on {}: {}",
                outcome.case.team_a, outcome.case.team_b, outcome.case.map, error
            ));
        }
    }

    if failed == 0 {
        print_success(&format!("{} matches compared", outcomes.len()));
    } else {
        print_warning(&format!("{} of {} matches failed", failed, outcomes.len()));
    }

    Ok(())
}

fn batch_row(case: &MatchArgs, result: &ComparisonResult) -> BatchRow {
    let votes_a = result
        .picks
        .iter()
        .filter(|p| p.winner == result.team_a)
        .count();
    let votes_b = result.picks.len() - votes_a;
    let mean = result
        .picks
        .iter()
        .map(|p| p.probability_team_a)
        .sum::<f64>()
        / result.picks.len() as f64;

    let favourite = if mean > 0.5 {
        &result.team_a
    } else {
        &result.team_b
    };

    BatchRow {
        matchup: format!("{} vs {}", result.team_a, result.team_b),
        map: case.map.trim().to_string(),
        favourite: favourite.clone(),
        votes: format!("{}-{}", votes_a, votes_b),
        agreement: color_agreement(result.agreement),
    }
}

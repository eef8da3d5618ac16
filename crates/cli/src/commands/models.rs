//! Model registry inspection

use anyhow::Result;
use predictor_lib::predictor::{LoadOutcome, LoadReport, ModelRegistry};
use tabled::Tabled;

use crate::output::{
    color_status, print_json, print_success, print_warning, render_table, short_checksum,
    OutputFormat,
};

/// Row for the load report table
#[derive(Tabled)]
struct LoadRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Detail")]
    detail: String,
}

impl From<&LoadReport> for LoadRow {
    fn from(report: &LoadReport) -> Self {
        let (kind, status, detail) = match &report.outcome {
            LoadOutcome::Loaded { kind, checksum } => {
                (kind.to_string(), "loaded", short_checksum(checksum))
            }
            LoadOutcome::Failed { reason } => ("-".to_string(), "failed", reason.clone()),
        };
        Self {
            name: report.name.clone(),
            kind,
            status: color_status(status),
            detail,
        }
    }
}

/// Show what loaded from the models directory and why anything did not
pub fn show_models(registry: &ModelRegistry, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(registry.reports())?,
        OutputFormat::Table => {
            let rows: Vec<LoadRow> = registry.reports().iter().map(LoadRow::from).collect();
            println!("{}", render_table(rows));

            let failed = registry.failures().count();
            if !registry.has_preprocessor() {
                print_warning(&format!(
                    "Preprocessor '{}' is not loaded; predictions will fail",
                    registry.preprocessor_name()
                ));
            } else if failed > 0 {
                print_warning(&format!("{} of {} models failed to load", failed, registry.reports().len()));
            } else {
                print_success(&format!("{} models loaded", registry.len()));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use predictor_lib::predictor::ArtifactKind;
    use std::path::PathBuf;

    #[test]
    fn test_load_row_from_reports() {
        colored::control::set_override(false);

        let loaded = LoadReport {
            name: "ensemble".to_string(),
            path: PathBuf::from("models/ensemble.onnx"),
            outcome: LoadOutcome::Loaded {
                kind: ArtifactKind::Classifier,
                checksum: "a1b2c3d4e5f60718293a4b5c".to_string(),
            },
        };
        let row = LoadRow::from(&loaded);
        assert_eq!(row.kind, "classifier");
        assert_eq!(row.status, "loaded");
        assert_eq!(row.detail, "a1b2c3d4e5f6");

        let failed = LoadReport {
            name: "neural_network".to_string(),
            path: PathBuf::from("models/neural_network.onnx"),
            outcome: LoadOutcome::Failed {
                reason: "Model file not found".to_string(),
            },
        };
        let row = LoadRow::from(&failed);
        assert_eq!(row.kind, "-");
        assert_eq!(row.status, "failed");
        assert_eq!(row.detail, "Model file not found");
    }
}

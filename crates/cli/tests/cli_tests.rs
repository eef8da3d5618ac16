//! CLI integration tests

use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn owcs(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_owcs"))
        .args(args)
        .env_remove("OWCS_MODELS_DIR")
        .env("NO_COLOR", "1")
        .output()
        .expect("Failed to execute command")
}

fn write_preprocessor(dir: &Path) {
    std::fs::write(
        dir.join("preprocessor.json"),
        r#"{
  "columns": [
    {"name": "team_name", "categories": ["Team Falcons", "Virtus.Pro"]},
    {"name": "team_name_opp", "categories": ["Team Falcons", "Virtus.Pro"]},
    {"name": "map_name", "categories": ["Busan", "King's Row"]}
  ],
  "handle_unknown": "ignore"
}"#,
    )
    .unwrap();
}

/// Test that the CLI shows help
#[test]
fn test_cli_help() {
    let output = owcs(&["--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI help should succeed");
    assert!(stdout.contains("OWCS match predictions"), "Should show app name");
    assert!(stdout.contains("predict"), "Should show predict command");
    assert!(stdout.contains("compare"), "Should show compare command");
    assert!(stdout.contains("batch"), "Should show batch command");
    assert!(stdout.contains("models"), "Should show models command");
    assert!(stdout.contains("--models-dir"), "Should show models-dir option");
}

/// Test that the CLI shows version
#[test]
fn test_cli_version() {
    let output = owcs(&["--version"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI version should succeed");
    assert!(stdout.contains("owcs"), "Should show binary name");
}

/// Test predict subcommand help
#[test]
fn test_predict_help() {
    let output = owcs(&["predict", "--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "Predict help should succeed");
    assert!(stdout.contains("--ban-a"), "Should show ban-a option");
    assert!(stdout.contains("--ban-b"), "Should show ban-b option");
    assert!(stdout.contains("--model"), "Should show model option");
}

/// Test that predict requires teams and map
#[test]
fn test_predict_missing_args() {
    let output = owcs(&["predict", "Team Falcons"]);
    assert!(!output.status.success(), "Predict without a map should fail");
}

/// Test the load report when nothing is present
#[test]
fn test_models_report_empty_dir() {
    let dir = TempDir::new().unwrap();
    let output = owcs(&[
        "--models-dir",
        dir.path().to_str().unwrap(),
        "--format",
        "json",
        "models",
    ]);

    assert!(output.status.success(), "Models should report failures, not fail");
    let reports: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let reports = reports.as_array().unwrap();
    assert_eq!(reports.len(), 5);
    assert!(reports.iter().all(|r| r["status"] == "failed"));
}

/// Test the load report with only the preprocessor present
#[test]
fn test_models_report_preprocessor_only() {
    let dir = TempDir::new().unwrap();
    write_preprocessor(dir.path());

    let output = owcs(&[
        "--models-dir",
        dir.path().to_str().unwrap(),
        "--format",
        "json",
        "models",
    ]);
    assert!(output.status.success());

    let reports: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let preprocessor = reports
        .as_array()
        .unwrap()
        .iter()
        .find(|r| r["name"] == "preprocessor")
        .unwrap();
    assert_eq!(preprocessor["status"], "loaded");
    assert_eq!(preprocessor["kind"], "preprocessor");
    assert_eq!(preprocessor["checksum"].as_str().unwrap().len(), 64);
}

/// Test that a missing classifier names the model
#[test]
fn test_predict_missing_model() {
    let dir = TempDir::new().unwrap();
    write_preprocessor(dir.path());

    let output = owcs(&[
        "--models-dir",
        dir.path().to_str().unwrap(),
        "predict",
        "Team Falcons",
        "Virtus.Pro",
        "Busan",
        "--model",
        "random_forest",
    ]);

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(!output.status.success(), "Predict without classifiers should fail");
    assert!(stderr.contains("Model 'random_forest' not found"), "{stderr}");
}

/// Test that compare reports missing classifiers
#[test]
fn test_compare_without_classifiers() {
    let dir = TempDir::new().unwrap();
    write_preprocessor(dir.path());

    let output = owcs(&[
        "--models-dir",
        dir.path().to_str().unwrap(),
        "compare",
        "Team Falcons",
        "Virtus.Pro",
        "Busan",
    ]);

    assert!(!output.status.success(), "Compare without classifiers should fail");
}

/// Test that batch reports per-case errors and keeps going
#[test]
fn test_batch_reports_case_errors() {
    let dir = TempDir::new().unwrap();
    let cases = dir.path().join("cases.json");
    std::fs::write(
        &cases,
        r#"[
  {"team_a": "Team Falcons", "team_b": "Virtus.Pro", "map": "Busan", "ban_a": "Ana"},
  {"team_a": "NTMR", "team_b": "", "map": "Ilios"}
]"#,
    )
    .unwrap();

    let output = owcs(&[
        "--models-dir",
        dir.path().to_str().unwrap(),
        "--format",
        "json",
        "batch",
        cases.to_str().unwrap(),
    ]);
    assert!(output.status.success(), "Batch should report errors per case");

    let outcomes: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let outcomes = outcomes.as_array().unwrap();
    assert_eq!(outcomes.len(), 2);
    assert!(outcomes.iter().all(|o| o["error"].is_string()));
    assert_eq!(outcomes[0]["case"]["ban_a"], "Ana");
}

/// Test that an unreadable batch file fails
#[test]
fn test_batch_missing_file() {
    let dir = TempDir::new().unwrap();
    let output = owcs(&[
        "--models-dir",
        dir.path().to_str().unwrap(),
        "batch",
        dir.path().join("absent.json").to_str().unwrap(),
    ]);

    assert!(!output.status.success());
}

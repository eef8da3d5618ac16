//! Output formatting utilities

use clap::ValueEnum;
use colored::Colorize;
use predictor_lib::predictor::format_percent;
use predictor_lib::Agreement;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Render rows as a rounded table
pub fn render_table<T: Tabled>(rows: Vec<T>) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

/// Print any serializable value as pretty JSON
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Color status based on value
pub fn color_status(status: &str) -> String {
    match status.to_lowercase().as_str() {
        "loaded" => status.green().to_string(),
        "failed" => status.red().to_string(),
        _ => status.to_string(),
    }
}

/// Color a winner's confidence based on how decisive it is
pub fn color_confidence(confidence: f64) -> String {
    let formatted = format_percent(confidence);
    if confidence >= 0.7 {
        formatted.green().to_string()
    } else if confidence >= 0.6 {
        formatted.yellow().to_string()
    } else {
        formatted.red().to_string()
    }
}

/// Color an agreement label
pub fn color_agreement(agreement: Agreement) -> String {
    let label = agreement.to_string();
    match agreement {
        Agreement::High => label.green().to_string(),
        Agreement::Medium => label.yellow().to_string(),
        Agreement::Low => label.red().to_string(),
    }
}

/// Shorten a hex checksum for table display
pub fn short_checksum(checksum: &str) -> String {
    checksum.chars().take(12).collect()
}

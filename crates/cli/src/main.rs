//! OWCS prediction CLI
//!
//! Runs the bot's models offline: single predictions, model comparisons,
//! batches of matches from a file, and a report of what loaded.

mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{models, predict, MatchArgs};
use predictor_lib::predictor::{default_model_paths, ModelRegistry, PredictionEngine};
use predictor_lib::DEFAULT_MODEL;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// OWCS match prediction CLI
#[derive(Parser)]
#[command(name = "owcs")]
#[command(author, version, about = "CLI for OWCS match predictions", long_about = None)]
pub struct Cli {
    /// Directory holding preprocessor.json and the classifier .onnx files
    #[arg(long, env = "OWCS_MODELS_DIR", default_value = "./models")]
    pub models_dir: PathBuf,

    /// Output format
    #[arg(long, short, default_value = "table")]
    pub format: output::OutputFormat,

    /// Enable verbose output
    #[arg(long, short)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Predict the winner of a match with one model
    Predict {
        #[command(flatten)]
        game: MatchArgs,

        /// Classifier to use
        #[arg(long, short, default_value = DEFAULT_MODEL)]
        model: String,
    },

    /// Run every loaded classifier on a match and report agreement
    Compare {
        #[command(flatten)]
        game: MatchArgs,
    },

    /// Compare every match in a JSON file
    Batch {
        /// JSON array of {team_a, team_b, map, ban_a?, ban_b?}
        file: PathBuf,
    },

    /// Show the model load report
    Models,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(std::io::stderr)
        .init();

    // Load models
    let registry = Arc::new(ModelRegistry::load(&default_model_paths(&cli.models_dir)));
    let engine = PredictionEngine::new(registry.clone());

    // Execute command
    match cli.command {
        Commands::Predict { game, model } => {
            predict::predict(&engine, &game, &model, cli.format)?;
        }
        Commands::Compare { game } => {
            predict::compare(&engine, &game, cli.format)?;
        }
        Commands::Batch { file } => {
            predict::batch(&engine, &file, cli.format)?;
        }
        Commands::Models => {
            models::show_models(&registry, cli.format)?;
        }
    }

    Ok(())
}

//! Bot configuration

use anyhow::{Context, Result};
use predictor_lib::predictor::default_model_paths;
use predictor_lib::{canonical_model_name, DEFAULT_MODEL};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

/// Config file read when `BOT_CONFIG` is not set
const DEFAULT_CONFIG_FILE: &str = "prediction-bot.toml";

/// Bot configuration
#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
    /// Name used in structured log events
    #[serde(default = "default_bot_name")]
    pub bot_name: String,

    /// API server port for health/metrics
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// Prefix that marks a chat message as a command
    #[serde(default = "default_command_prefix")]
    pub command_prefix: String,

    /// Directory holding the default model artifacts
    #[serde(default = "default_models_dir")]
    pub models_dir: PathBuf,

    /// Model used when `predict` does not name one
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Explicit name → path entries, overriding the defaults
    #[serde(default)]
    pub models: HashMap<String, PathBuf>,
}

fn default_bot_name() -> String {
    "owcs-prediction-bot".to_string()
}

fn default_api_port() -> u16 {
    8080
}

fn default_command_prefix() -> String {
    "!".to_string()
}

fn default_models_dir() -> PathBuf {
    PathBuf::from("./models")
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

impl BotConfig {
    /// Load configuration from the config file and `BOT_*` environment
    pub fn load() -> Result<Self> {
        let path = std::env::var("BOT_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        Self::load_from(Path::new(&path))
    }

    /// Load configuration from `path` (optional) layered under the environment
    pub fn load_from(path: &Path) -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::from(path).required(false))
            .add_source(config::Environment::with_prefix("BOT").try_parsing(true))
            .build()
            .context("Failed to read bot configuration")?;

        let mut bot_config: Self = config
            .try_deserialize()
            .context("Invalid bot configuration")?;
        bot_config.default_model = canonical_model_name(&bot_config.default_model);
        Ok(bot_config)
    }

    /// Artifact paths to load, defaults first then explicit entries
    ///
    /// Keys are canonical model names, so `[models] XGBoost` is served as `xgboost`.
    pub fn model_paths(&self) -> BTreeMap<String, PathBuf> {
        let mut paths = default_model_paths(&self.models_dir);
        paths.extend(
            self.models
                .iter()
                .map(|(name, path)| (canonical_model_name(name), path.clone())),
        );
        paths
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let config = BotConfig::load_from(&dir.path().join("absent.toml")).unwrap();

        assert_eq!(config.command_prefix, "!");
        assert_eq!(config.default_model, DEFAULT_MODEL);
        assert_eq!(config.models_dir, PathBuf::from("./models"));
        assert!(config.models.is_empty());
    }

    #[test]
    fn test_file_overrides_and_extra_models() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bot.toml");
        std::fs::write(
            &path,
            r#"
bot_name = "falcons-watch"
command_prefix = "?"
models_dir = "/srv/models"
default_model = "random_forest"

[models]
ensemble = "/srv/models/ensemble_v2.onnx"
gradient_boosting = "/srv/models/gradient_boosting.onnx"
"#,
        )
        .unwrap();

        let config = BotConfig::load_from(&path).unwrap();
        assert_eq!(config.bot_name, "falcons-watch");
        assert_eq!(config.command_prefix, "?");
        assert_eq!(config.default_model, "random_forest");

        let paths = config.model_paths();
        assert_eq!(paths.len(), 6);
        assert_eq!(paths["ensemble"], PathBuf::from("/srv/models/ensemble_v2.onnx"));
        assert_eq!(paths["extra_trees"], PathBuf::from("/srv/models/extra_trees.onnx"));
        assert_eq!(paths["gradient_boosting"], PathBuf::from("/srv/models/gradient_boosting.onnx"));
    }

    #[test]
    fn test_mixed_case_model_names_resolve() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bot.toml");
        std::fs::write(
            &path,
            r#"
default_model = "XGBoost"

[models]
XGBoost = "/srv/models/xgboost.onnx"
Ensemble = "/srv/models/ensemble_v2.onnx"
"#,
        )
        .unwrap();

        let config = BotConfig::load_from(&path).unwrap();
        assert_eq!(config.default_model, "xgboost");

        let paths = config.model_paths();
        assert_eq!(paths["xgboost"], PathBuf::from("/srv/models/xgboost.onnx"));
        assert_eq!(paths["ensemble"], PathBuf::from("/srv/models/ensemble_v2.onnx"));
        assert!(paths.contains_key(&config.default_model));
        assert_eq!(paths.len(), 6);
    }
}

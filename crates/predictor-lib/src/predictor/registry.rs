//! Model registry loaded once at startup
//!
//! Every configured artifact is loaded independently: a missing or broken
//! file is recorded in the load report and its name stays absent, while the
//! remaining entries load normally. The registry is immutable afterwards.

use super::inference::OnnxClassifier;
use super::preprocess::OneHotPreprocessor;
use super::{Classifier, Preprocessor};
use crate::error::{LoadError, PredictError, PredictResult};
use crate::models::{canonical_model_name, PREPROCESSOR_NAME};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// Model files shipped by the training step
const DEFAULT_ARTIFACTS: &[(&str, &str)] = &[
    ("random_forest", "random_forest.onnx"),
    ("extra_trees", "extra_trees.onnx"),
    ("neural_network", "neural_network.onnx"),
    ("ensemble", "ensemble.onnx"),
    (PREPROCESSOR_NAME, "preprocessor.json"),
];

/// Default name → path mapping for artifacts under `models_dir`
pub fn default_model_paths(models_dir: &Path) -> BTreeMap<String, PathBuf> {
    DEFAULT_ARTIFACTS
        .iter()
        .map(|(name, file)| (name.to_string(), models_dir.join(file)))
        .collect()
}

/// Capability kind of a registry entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Preprocessor,
    Classifier,
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactKind::Preprocessor => write!(f, "preprocessor"),
            ArtifactKind::Classifier => write!(f, "classifier"),
        }
    }
}

/// A loaded model artifact
#[derive(Clone)]
pub enum ModelArtifact {
    Preprocessor(Arc<dyn Preprocessor>),
    Classifier(Arc<dyn Classifier>),
}

impl ModelArtifact {
    pub fn kind(&self) -> ArtifactKind {
        match self {
            ModelArtifact::Preprocessor(_) => ArtifactKind::Preprocessor,
            ModelArtifact::Classifier(_) => ArtifactKind::Classifier,
        }
    }
}

impl fmt::Debug for ModelArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ModelArtifact({})", self.kind())
    }
}

/// Result of loading one configured entry
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum LoadOutcome {
    Loaded { kind: ArtifactKind, checksum: String },
    Failed { reason: String },
}

/// Load diagnostics for one configured entry
#[derive(Debug, Clone, Serialize)]
pub struct LoadReport {
    pub name: String,
    pub path: PathBuf,
    #[serde(flatten)]
    pub outcome: LoadOutcome,
}

impl LoadReport {
    pub fn is_loaded(&self) -> bool {
        matches!(self.outcome, LoadOutcome::Loaded { .. })
    }
}

/// Read-only collection of named preprocessors and classifiers
#[derive(Debug, Clone)]
pub struct ModelRegistry {
    entries: BTreeMap<String, ModelArtifact>,
    reports: Vec<LoadReport>,
    preprocessor_name: String,
}

impl ModelRegistry {
    /// Load every entry of `paths`, treating `preprocessor` as the transform
    pub fn load(paths: &BTreeMap<String, PathBuf>) -> Self {
        Self::load_with_preprocessor(paths, PREPROCESSOR_NAME)
    }

    /// Load every entry of `paths` with a custom preprocessor entry name
    ///
    /// Entry names are stored in canonical (lowercase) form.
    pub fn load_with_preprocessor(paths: &BTreeMap<String, PathBuf>, preprocessor_name: &str) -> Self {
        let paths: BTreeMap<String, &PathBuf> = paths
            .iter()
            .map(|(name, path)| (canonical_model_name(name), path))
            .collect();
        let preprocessor_name = canonical_model_name(preprocessor_name);
        let preprocessor_name = preprocessor_name.as_str();

        let mut entries = BTreeMap::new();
        let mut reports = Vec::with_capacity(paths.len());

        // The preprocessor goes first so classifiers can be pinned to its width
        let mut input_width = None;
        if let Some(path) = paths.get(preprocessor_name) {
            let result = load_preprocessor(path);
            if let Ok((preprocessor, _)) = &result {
                input_width = preprocessor.output_width();
            }
            let report = record(preprocessor_name, path, ArtifactKind::Preprocessor, result, &mut entries);
            reports.push(report);
        }

        for (name, path) in paths.iter().filter(|(name, _)| name.as_str() != preprocessor_name) {
            let result = load_classifier(name, path, input_width);
            let report = record(name, path, ArtifactKind::Classifier, result, &mut entries);
            reports.push(report);
        }

        info!(
            loaded = entries.len(),
            failed = reports.iter().filter(|r| !r.is_loaded()).count(),
            "Model registry initialized"
        );

        Self {
            entries,
            reports,
            preprocessor_name: preprocessor_name.to_string(),
        }
    }

    /// Build a registry from already-constructed artifacts
    ///
    /// A later artifact with the same name replaces an earlier one.
    pub fn from_artifacts<I>(artifacts: I) -> Self
    where
        I: IntoIterator<Item = (String, ModelArtifact)>,
    {
        Self {
            entries: artifacts
                .into_iter()
                .map(|(name, artifact)| (canonical_model_name(&name), artifact))
                .collect(),
            reports: Vec::new(),
            preprocessor_name: PREPROCESSOR_NAME.to_string(),
        }
    }

    /// Look up an entry by name, ignoring case
    pub fn get(&self, name: &str) -> PredictResult<&ModelArtifact> {
        self.entries
            .get(&canonical_model_name(name))
            .ok_or_else(|| PredictError::ModelNotFound(name.to_string()))
    }

    /// The fitted preprocessing transform
    pub fn preprocessor(&self) -> PredictResult<&dyn Preprocessor> {
        match self.get(&self.preprocessor_name)? {
            ModelArtifact::Preprocessor(p) => Ok(p.as_ref()),
            ModelArtifact::Classifier(_) => {
                Err(PredictError::ModelNotFound(self.preprocessor_name.clone()))
            }
        }
    }

    /// A classifier by name
    pub fn classifier(&self, name: &str) -> PredictResult<&dyn Classifier> {
        match self.get(name)? {
            ModelArtifact::Classifier(c) => Ok(c.as_ref()),
            ModelArtifact::Preprocessor(_) => Err(PredictError::NotAClassifier(name.to_string())),
        }
    }

    /// Names of all loaded entries
    pub fn names(&self) -> BTreeSet<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    /// Names of loaded classifiers, in name order
    pub fn classifier_names(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(_, artifact)| artifact.kind() == ArtifactKind::Classifier)
            .map(|(name, _)| name.as_str())
            .collect()
    }

    pub fn preprocessor_name(&self) -> &str {
        &self.preprocessor_name
    }

    pub fn has_preprocessor(&self) -> bool {
        self.preprocessor().is_ok()
    }

    /// Per-entry load diagnostics, empty for registries built in memory
    pub fn reports(&self) -> &[LoadReport] {
        &self.reports
    }

    /// Entries that failed to load
    pub fn failures(&self) -> impl Iterator<Item = &LoadReport> {
        self.reports.iter().filter(|r| !r.is_loaded())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn read_artifact(path: &Path) -> Result<Vec<u8>, LoadError> {
    if !path.exists() {
        return Err(LoadError::NotFound(path.to_path_buf()));
    }
    fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn load_preprocessor(path: &Path) -> Result<(Arc<OneHotPreprocessor>, String), LoadError> {
    let bytes = read_artifact(path)?;
    let preprocessor = OneHotPreprocessor::from_json(&bytes)?;
    Ok((Arc::new(preprocessor), compute_checksum(&bytes)))
}

fn load_classifier(
    name: &str,
    path: &Path,
    input_width: Option<usize>,
) -> Result<(Arc<OnnxClassifier>, String), LoadError> {
    let bytes = read_artifact(path)?;
    let classifier = OnnxClassifier::from_bytes(name, &bytes, input_width)?;
    Ok((Arc::new(classifier), compute_checksum(&bytes)))
}

/// Insert a successful load and produce the report for either outcome
fn record<T>(
    name: &str,
    path: &Path,
    kind: ArtifactKind,
    result: Result<(Arc<T>, String), LoadError>,
    entries: &mut BTreeMap<String, ModelArtifact>,
) -> LoadReport
where
    T: IntoArtifact + 'static,
{
    let outcome = match result {
        Ok((artifact, checksum)) => {
            info!(
                event = "model_loaded",
                model = %name,
                kind = %kind,
                path = %path.display(),
                checksum = %checksum,
                "Loaded model"
            );
            entries.insert(name.to_string(), T::into_artifact(artifact));
            LoadOutcome::Loaded { kind, checksum }
        }
        Err(e) => {
            warn!(
                event = "model_load_failed",
                model = %name,
                kind = %kind,
                path = %path.display(),
                error = %e,
                "Model not loaded"
            );
            LoadOutcome::Failed {
                reason: e.to_string(),
            }
        }
    };

    LoadReport {
        name: name.to_string(),
        path: path.to_path_buf(),
        outcome,
    }
}

/// Wraps a concrete artifact into its registry variant
trait IntoArtifact {
    fn into_artifact(this: Arc<Self>) -> ModelArtifact;
}

impl IntoArtifact for OneHotPreprocessor {
    fn into_artifact(this: Arc<Self>) -> ModelArtifact {
        ModelArtifact::Preprocessor(this)
    }
}

impl IntoArtifact for OnnxClassifier {
    fn into_artifact(this: Arc<Self>) -> ModelArtifact {
        ModelArtifact::Classifier(this)
    }
}

/// Compute SHA256 checksum of data
fn compute_checksum(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const PREPROCESSOR_JSON: &str = r#"{
        "columns": [
            {"name": "team_name", "categories": ["A", "B"]},
            {"name": "map_name", "categories": ["Busan"]}
        ],
        "handle_unknown": "ignore"
    }"#;

    fn write(dir: &TempDir, file: &str, contents: &[u8]) -> PathBuf {
        let path = dir.path().join(file);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_default_model_paths() {
        let paths = default_model_paths(Path::new("models"));
        assert_eq!(paths.len(), 5);
        assert_eq!(paths["ensemble"], Path::new("models").join("ensemble.onnx"));
        assert_eq!(paths[PREPROCESSOR_NAME], Path::new("models").join("preprocessor.json"));
    }

    #[test]
    fn test_partial_load_keeps_successful_entries() {
        let dir = TempDir::new().unwrap();
        let mut paths = BTreeMap::new();
        paths.insert(
            PREPROCESSOR_NAME.to_string(),
            write(&dir, "preprocessor.json", PREPROCESSOR_JSON.as_bytes()),
        );
        paths.insert("ensemble".to_string(), dir.path().join("missing.onnx"));
        paths.insert(
            "random_forest".to_string(),
            write(&dir, "random_forest.onnx", b"not an onnx graph"),
        );

        let registry = ModelRegistry::load(&paths);

        assert_eq!(registry.names(), BTreeSet::from([PREPROCESSOR_NAME]));
        assert!(registry.has_preprocessor());
        assert!(registry.classifier_names().is_empty());
        assert_eq!(registry.reports().len(), 3);
        assert_eq!(registry.reports()[0].name, PREPROCESSOR_NAME);

        let failed: Vec<&str> = registry.failures().map(|r| r.name.as_str()).collect();
        assert_eq!(failed, vec!["ensemble", "random_forest"]);
    }

    #[test]
    fn test_checksum_recorded_for_loaded_entries() {
        let dir = TempDir::new().unwrap();
        let mut paths = BTreeMap::new();
        paths.insert(
            PREPROCESSOR_NAME.to_string(),
            write(&dir, "preprocessor.json", PREPROCESSOR_JSON.as_bytes()),
        );

        let registry = ModelRegistry::load(&paths);
        match &registry.reports()[0].outcome {
            LoadOutcome::Loaded { kind, checksum } => {
                assert_eq!(*kind, ArtifactKind::Preprocessor);
                assert_eq!(checksum, &compute_checksum(PREPROCESSOR_JSON.as_bytes()));
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn test_invalid_preprocessor_reported() {
        let dir = TempDir::new().unwrap();
        let mut paths = BTreeMap::new();
        paths.insert(
            PREPROCESSOR_NAME.to_string(),
            write(&dir, "preprocessor.json", b"{\"columns\": []}"),
        );

        let registry = ModelRegistry::load(&paths);
        assert!(registry.is_empty());
        assert!(!registry.has_preprocessor());
        assert_eq!(registry.failures().count(), 1);
    }

    #[test]
    fn test_missing_entry_is_model_not_found() {
        let registry = ModelRegistry::load(&BTreeMap::new());
        assert_eq!(
            registry.get("ensemble").unwrap_err(),
            PredictError::ModelNotFound("ensemble".to_string())
        );
        assert!(matches!(
            registry.preprocessor(),
            Err(PredictError::ModelNotFound(_))
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_preprocessor_is_not_a_classifier() {
        let preprocessor = OneHotPreprocessor::from_json(PREPROCESSOR_JSON.as_bytes()).unwrap();
        let registry = ModelRegistry::from_artifacts([(
            PREPROCESSOR_NAME.to_string(),
            ModelArtifact::Preprocessor(Arc::new(preprocessor)),
        )]);

        assert!(matches!(
            registry.classifier(PREPROCESSOR_NAME),
            Err(PredictError::NotAClassifier(_))
        ));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_entry_names_are_case_insensitive() {
        let dir = TempDir::new().unwrap();
        let mut paths = BTreeMap::new();
        paths.insert(
            "Preprocessor".to_string(),
            write(&dir, "preprocessor.json", PREPROCESSOR_JSON.as_bytes()),
        );

        let registry = ModelRegistry::load(&paths);
        assert!(registry.has_preprocessor());
        assert_eq!(registry.reports()[0].name, PREPROCESSOR_NAME);
        assert!(registry.get("PREPROCESSOR").is_ok());

        let preprocessor = OneHotPreprocessor::from_json(PREPROCESSOR_JSON.as_bytes()).unwrap();
        let registry = ModelRegistry::from_artifacts([(
            "XGBoost".to_string(),
            ModelArtifact::Preprocessor(Arc::new(preprocessor)),
        )]);
        assert_eq!(registry.names(), BTreeSet::from(["xgboost"]));
        assert!(registry.get("XGBoost").is_ok());
        assert_eq!(
            registry.get("lightgbm").unwrap_err(),
            PredictError::ModelNotFound("lightgbm".to_string())
        );
    }

    /// Collects formatted log output for assertions
    #[derive(Clone, Default)]
    struct LogBuffer(Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_load_events_logged() {
        let dir = TempDir::new().unwrap();
        let mut paths = BTreeMap::new();
        paths.insert(
            PREPROCESSOR_NAME.to_string(),
            write(&dir, "preprocessor.json", PREPROCESSOR_JSON.as_bytes()),
        );
        paths.insert("ensemble".to_string(), dir.path().join("missing.onnx"));

        let buffer = LogBuffer::default();
        let writer = buffer.clone();
        let subscriber = tracing_subscriber::fmt()
            .json()
            .with_writer(move || writer.clone())
            .finish();
        tracing::subscriber::with_default(subscriber, || ModelRegistry::load(&paths));

        let output = String::from_utf8(buffer.0.lock().unwrap().clone()).unwrap();
        let events: Vec<serde_json::Value> = output
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        let event_for = |model: &str| {
            events
                .iter()
                .find(|e| e["fields"]["model"] == model)
                .map(|e| e["fields"]["event"].clone())
        };

        assert_eq!(event_for(PREPROCESSOR_NAME), Some("model_loaded".into()));
        assert_eq!(event_for("ensemble"), Some("model_load_failed".into()));
    }

    #[test]
    fn test_compute_checksum() {
        let checksum = compute_checksum(b"model bytes");
        assert_eq!(checksum.len(), 64);
        assert_eq!(checksum, compute_checksum(b"model bytes"));
    }
}

//! Model adapter: Implementation of `Classifier` over a JSON model export.
//!
//! The training pipeline exports its fitted estimator as `model.json`:
//!
//! ```json
//! {
//!   "format_version": 1,
//!   "feature_names": ["age", "gender", "..."],
//!   "category_codes": { "usg_composition": { "Cystic": 0, "Mixed": 1, "Solid": 2 } },
//!   "estimator": { "type": "logistic_regression", "coefficients": [], "intercept": 0.0 }
//! }
//! ```
//!
//! Supported estimators are logistic regression (with optional standard
//! scaling) and random forests of binary decision trees.
//!
//! # Integrity
//!
//! If a `manifest.json` sits next to the model file, every file it lists
//! must match its SHA-256 digest and the model file itself must be listed.
//! With `require_manifest`, a model without a manifest is refused.
//! [`IntegrityManifest::for_model`] builds that manifest; `hash_model`
//! writes it.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::domain::LabelCodes;
use crate::ports::{ensure_record_features, Classifier, ClassifierError};
use crate::ThyrodxError;

/// File name of the model export inside a model directory.
pub const MODEL_FILE: &str = "model.json";

/// File name of the optional integrity manifest.
pub const MANIFEST_FILE: &str = "manifest.json";

/// Model export format understood by this adapter.
pub const SUPPORTED_FORMAT_VERSION: u32 = 1;

/// Integrity manifest format written and accepted.
pub const MANIFEST_VERSION: u32 = 1;

/// Model parameters exported by the training pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportedModel {
    pub format_version: u32,
    pub feature_names: Vec<String>,
    /// Training-time codes for labelled fields, `field -> label -> code`.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub category_codes: BTreeMap<String, BTreeMap<String, u32>>,
    pub estimator: Estimator,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Estimator {
    LogisticRegression(LogisticRegression),
    RandomForest(RandomForest),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticRegression {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    /// Standard scaler parameters; both or neither.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scaler_mean: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scaler_scale: Option<Vec<f64>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    pub trees: Vec<DecisionTree>,
}

/// A binary decision tree in flat pre-order layout (node 0 is the root).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    pub nodes: Vec<TreeNode>,
}

/// Split node when `feature` is set, leaf otherwise.
///
/// Samples with `x[feature] <= threshold` go left.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeNode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature: Option<usize>,
    #[serde(default)]
    pub threshold: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right: Option<usize>,
    /// Class weights at this node, `[class0, class1]`.
    pub value: [f64; 2],
}

/// Contents of `manifest.json`: hex SHA-256 per file, keyed by its path
/// relative to the model directory.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct IntegrityManifest {
    pub version: u32,
    pub files: BTreeMap<String, String>,
}

impl IntegrityManifest {
    /// Hash `model_file` and the `extras` bound to it.
    ///
    /// `extras` are relative to the model's directory.
    ///
    /// # Errors
    /// `Io` if a file cannot be read, `Validation` if `extras` lists the
    /// manifest itself.
    pub fn for_model(model_file: &Path, extras: &[String]) -> crate::Result<Self> {
        let base_dir = model_dir(model_file);
        let mut files = BTreeMap::new();
        files.insert(
            model_file_name(model_file).to_string(),
            sha256_hex_bytes(&fs::read(model_file)?),
        );

        for rel in extras {
            if rel == MANIFEST_FILE {
                return Err(ThyrodxError::Validation(format!(
                    "{MANIFEST_FILE} cannot list itself"
                )));
            }
            files.insert(rel.clone(), sha256_hex_bytes(&fs::read(base_dir.join(rel))?));
        }

        Ok(Self {
            version: MANIFEST_VERSION,
            files,
        })
    }

    /// Write the manifest next to `model_file` and return its path.
    ///
    /// # Errors
    /// `Serialization` or `Io` if the file cannot be produced.
    pub fn write_for(&self, model_file: &Path) -> crate::Result<PathBuf> {
        let path = model_dir(model_file).join(MANIFEST_FILE);
        fs::write(&path, serde_json::to_vec_pretty(self)?)?;
        Ok(path)
    }
}

fn sha256_hex_bytes(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

fn model_dir(model_file: &Path) -> &Path {
    model_file.parent().unwrap_or(Path::new("."))
}

fn model_file_name(model_file: &Path) -> &str {
    model_file
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(MODEL_FILE)
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Resolve a configured model path to the model file.
///
/// A directory resolves to its `model.json`; anything else is taken as the
/// file itself.
#[must_use]
pub fn resolve_model_file(path: &Path) -> PathBuf {
    if path.is_dir() {
        path.join(MODEL_FILE)
    } else {
        path.to_path_buf()
    }
}

/// Classifier backed by a JSON model export.
///
/// Immutable after [`ModelClassifier::load`]; share it behind an `Arc`.
#[derive(Debug)]
pub struct ModelClassifier {
    model: ExportedModel,
    codes: LabelCodes,
    source: PathBuf,
}

impl ModelClassifier {
    /// Load and validate a model export.
    ///
    /// `path` is either a model directory or the model file.
    /// `require_manifest` refuses a model that has no integrity manifest.
    ///
    /// # Errors
    /// `ArtifactMissing` if the file does not exist, `FeatureMismatch` if the
    /// features differ from the clinical record, `ArtifactLoad` for anything
    /// else (I/O, JSON, manifest, version, estimator shape).
    pub fn load(path: &Path, require_manifest: bool) -> Result<Self, ClassifierError> {
        let model_path = resolve_model_file(path);
        if !model_path.is_file() {
            tracing::error!("Model artifact not found at {:?}", model_path);
            return Err(ClassifierError::ArtifactMissing { path: model_path });
        }

        let load_err = |reason: String| ClassifierError::ArtifactLoad {
            path: model_path.clone(),
            reason,
        };

        let bytes = fs::read(&model_path).map_err(|e| load_err(e.to_string()))?;
        Self::verify_manifest(&model_path, &bytes, require_manifest).map_err(load_err)?;

        let model: ExportedModel =
            serde_json::from_slice(&bytes).map_err(|e| load_err(e.to_string()))?;

        let classifier = Self::from_model(model).map_err(|e| match e {
            ClassifierError::Inference(reason) => load_err(reason),
            other => other,
        })?;

        tracing::info!(
            "Loaded {} model from {:?}",
            classifier.estimator_name(),
            model_path
        );
        if classifier.codes.has_overrides() {
            tracing::info!("Using category codes from the model export");
        }

        Ok(Self {
            source: model_path,
            ..classifier
        })
    }

    /// Validate an in-memory model export.
    ///
    /// # Errors
    /// `FeatureMismatch` for a wrong feature list; `Inference` describing
    /// any other structural problem.
    pub fn from_model(model: ExportedModel) -> Result<Self, ClassifierError> {
        if model.format_version != SUPPORTED_FORMAT_VERSION {
            return Err(ClassifierError::Inference(format!(
                "Unsupported format_version {} (expected {SUPPORTED_FORMAT_VERSION})",
                model.format_version
            )));
        }

        ensure_record_features(&model.feature_names)?;

        let codes = LabelCodes::from_table(model.category_codes.clone())
            .map_err(ClassifierError::Inference)?;

        Self::validate_estimator(&model.estimator, model.feature_names.len())
            .map_err(ClassifierError::Inference)?;

        Ok(Self {
            model,
            codes,
            source: PathBuf::new(),
        })
    }

    /// Path the model was loaded from (empty for in-memory models).
    #[must_use]
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Short estimator name for status display.
    #[must_use]
    pub fn estimator_name(&self) -> &'static str {
        match self.model.estimator {
            Estimator::LogisticRegression(_) => "logistic regression",
            Estimator::RandomForest(_) => "random forest",
        }
    }

    fn verify_manifest(
        model_path: &Path,
        model_bytes: &[u8],
        require_manifest: bool,
    ) -> Result<(), String> {
        let base_dir = model_dir(model_path);
        let manifest_path = base_dir.join(MANIFEST_FILE);
        if !manifest_path.exists() {
            if require_manifest {
                tracing::error!(
                    "Integrity manifest required but not found at {:?}",
                    manifest_path
                );
                return Err(format!("{MANIFEST_FILE} required but not found"));
            }
            tracing::debug!("No integrity manifest next to model; skipping hash check");
            return Ok(());
        }

        let content = fs::read(&manifest_path)
            .map_err(|e| format!("Failed to read manifest: {e}"))?;
        let manifest: IntegrityManifest = serde_json::from_slice(&content)
            .map_err(|e| format!("Invalid manifest.json format: {e}"))?;
        if manifest.version != MANIFEST_VERSION {
            return Err(format!("Unsupported manifest version: {}", manifest.version));
        }

        let model_name = model_file_name(model_path);
        if !manifest.files.contains_key(model_name) {
            return Err(format!("manifest.json does not list {model_name}"));
        }

        for (rel, expected_hex) in &manifest.files {
            let actual_hex = if rel == model_name {
                sha256_hex_bytes(model_bytes)
            } else {
                let bytes = fs::read(base_dir.join(rel)).map_err(|e| {
                    format!("Manifest references missing/unreadable file {rel}: {e}")
                })?;
                sha256_hex_bytes(&bytes)
            };

            if !actual_hex.eq_ignore_ascii_case(expected_hex.trim()) {
                return Err(format!("File hash mismatch for {rel}"));
            }
        }

        tracing::info!("Model hashes verified against {}", MANIFEST_FILE);
        Ok(())
    }

    fn validate_estimator(estimator: &Estimator, n: usize) -> Result<(), String> {
        match estimator {
            Estimator::LogisticRegression(lr) => {
                if lr.coefficients.len() != n {
                    return Err(format!(
                        "Expected {n} coefficients, got {}",
                        lr.coefficients.len()
                    ));
                }
                if lr.coefficients.iter().any(|c| !c.is_finite()) || !lr.intercept.is_finite() {
                    return Err("Coefficients must be finite".into());
                }
                match (&lr.scaler_mean, &lr.scaler_scale) {
                    (None, None) => {}
                    (Some(mean), Some(scale)) => {
                        if mean.len() != n || scale.len() != n {
                            return Err(format!("Scaler parameters must have {n} entries"));
                        }
                        if scale.iter().any(|s| !s.is_finite() || *s == 0.0) {
                            return Err("Scaler scale entries must be finite and non-zero".into());
                        }
                    }
                    _ => {
                        return Err("scaler_mean and scaler_scale must be given together".into())
                    }
                }
            }
            Estimator::RandomForest(forest) => {
                if forest.trees.is_empty() {
                    return Err("Random forest has no trees".into());
                }
                for (t, tree) in forest.trees.iter().enumerate() {
                    Self::validate_tree(tree, n).map_err(|e| format!("tree {t}: {e}"))?;
                }
            }
        }
        Ok(())
    }

    fn validate_tree(tree: &DecisionTree, n: usize) -> Result<(), String> {
        if tree.nodes.is_empty() {
            return Err("no nodes".into());
        }

        for (i, node) in tree.nodes.iter().enumerate() {
            if node.value.iter().any(|v| !v.is_finite() || *v < 0.0) {
                return Err(format!("node {i} has invalid class weights"));
            }
            match (node.feature, node.left, node.right) {
                (None, None, None) => {
                    if node.value[0] + node.value[1] <= 0.0 {
                        return Err(format!("leaf {i} has no weight"));
                    }
                }
                (Some(feature), Some(left), Some(right)) => {
                    if feature >= n {
                        return Err(format!("node {i} splits on feature {feature} (max {n})"));
                    }
                    if !node.threshold.is_finite() {
                        return Err(format!("node {i} has a non-finite threshold"));
                    }
                    // Children strictly after the parent: traversal always terminates.
                    for child in [left, right] {
                        if child <= i || child >= tree.nodes.len() {
                            return Err(format!("node {i} has invalid child {child}"));
                        }
                    }
                }
                _ => return Err(format!("node {i} is neither a split nor a leaf")),
            }
        }
        Ok(())
    }

    fn tree_proba(tree: &DecisionTree, features: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            let node = &tree.nodes[idx];
            match (node.feature, node.left, node.right) {
                (Some(feature), Some(left), Some(right)) => {
                    idx = if features[feature] <= node.threshold {
                        left
                    } else {
                        right
                    };
                }
                _ => return node.value[1] / (node.value[0] + node.value[1]),
            }
        }
    }
}

impl Classifier for ModelClassifier {
    fn feature_names(&self) -> &[String] {
        &self.model.feature_names
    }

    fn label_codes(&self) -> &LabelCodes {
        &self.codes
    }

    fn predict_proba(&self, features: &[f64]) -> Result<[f64; 2], ClassifierError> {
        let n = self.model.feature_names.len();
        if features.len() != n {
            return Err(ClassifierError::Inference(format!(
                "Expected {n} features, got {}",
                features.len()
            )));
        }
        if features.iter().any(|x| !x.is_finite()) {
            return Err(ClassifierError::Inference(
                "Feature vector contains non-finite values".into(),
            ));
        }

        let p1 = match &self.model.estimator {
            Estimator::LogisticRegression(lr) => {
                let mut z = lr.intercept;
                for (i, (x, w)) in features.iter().zip(&lr.coefficients).enumerate() {
                    let x = match (&lr.scaler_mean, &lr.scaler_scale) {
                        (Some(mean), Some(scale)) => (x - mean[i]) / scale[i],
                        _ => *x,
                    };
                    z += w * x;
                }
                sigmoid(z)
            }
            Estimator::RandomForest(forest) => {
                let total: f64 = forest
                    .trees
                    .iter()
                    .map(|tree| Self::tree_proba(tree, features))
                    .sum();
                total / forest.trees.len() as f64
            }
        };

        if !p1.is_finite() {
            return Err(ClassifierError::Inference(
                "Model produced a non-finite probability".into(),
            ));
        }

        Ok([1.0 - p1, p1])
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::domain::record::field_names;
    use crate::domain::FIELD_COUNT;
    use tempfile::tempdir;

    /// Logistic model whose only non-zero weight is on `usg_tirads`.
    pub(crate) fn tirads_model(weight: f64, intercept: f64) -> ExportedModel {
        let mut coefficients = vec![0.0; FIELD_COUNT];
        coefficients[2] = weight;
        ExportedModel {
            format_version: SUPPORTED_FORMAT_VERSION,
            feature_names: field_names().iter().map(|s| (*s).to_string()).collect(),
            category_codes: BTreeMap::new(),
            estimator: Estimator::LogisticRegression(LogisticRegression {
                coefficients,
                intercept,
                scaler_mean: None,
                scaler_scale: None,
            }),
        }
    }

    fn leaf(class0: f64, class1: f64) -> TreeNode {
        TreeNode {
            feature: None,
            threshold: 0.0,
            left: None,
            right: None,
            value: [class0, class1],
        }
    }

    fn stump(feature: usize, threshold: f64, low: [f64; 2], high: [f64; 2]) -> DecisionTree {
        DecisionTree {
            nodes: vec![
                TreeNode {
                    feature: Some(feature),
                    threshold,
                    left: Some(1),
                    right: Some(2),
                    value: [low[0] + high[0], low[1] + high[1]],
                },
                leaf(low[0], low[1]),
                leaf(high[0], high[1]),
            ],
        }
    }

    fn forest_model(trees: Vec<DecisionTree>) -> ExportedModel {
        ExportedModel {
            estimator: Estimator::RandomForest(RandomForest { trees }),
            ..tirads_model(0.0, 0.0)
        }
    }

    fn features_with(index: usize, value: f64) -> Vec<f64> {
        let mut v = vec![0.0; FIELD_COUNT];
        v[index] = value;
        v
    }

    fn write_model(dir: &Path, model: &ExportedModel) -> PathBuf {
        let path = dir.join(MODEL_FILE);
        fs::write(&path, serde_json::to_vec(model).expect("serialize")).expect("write model");
        path
    }

    #[test]
    fn test_logistic_probability() {
        let clf = ModelClassifier::from_model(tirads_model(1.0, -3.0)).expect("valid");
        let [p0, p1] = clf.predict_proba(&features_with(2, 3.0)).expect("predict");
        assert!((p1 - 0.5).abs() < 1e-12);
        assert!((p0 + p1 - 1.0).abs() < 1e-12);

        let [_, high] = clf.predict_proba(&features_with(2, 5.0)).expect("predict");
        assert!(high > 0.85);
        assert_eq!(clf.predict(&features_with(2, 5.0)).unwrap(), 1);
        assert_eq!(clf.predict(&features_with(2, 1.0)).unwrap(), 0);
    }

    #[test]
    fn test_logistic_scaler() {
        let mut model = tirads_model(2.0, 0.0);
        if let Estimator::LogisticRegression(lr) = &mut model.estimator {
            let mut mean = vec![0.0; FIELD_COUNT];
            mean[2] = 3.0;
            lr.scaler_mean = Some(mean);
            lr.scaler_scale = Some(vec![1.0; FIELD_COUNT]);
        }
        let clf = ModelClassifier::from_model(model).expect("valid");
        let [_, p1] = clf.predict_proba(&features_with(2, 3.0)).unwrap();
        assert!((p1 - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_random_forest_averages_trees() {
        let model = forest_model(vec![
            stump(2, 3.5, [9.0, 1.0], [1.0, 9.0]),
            stump(2, 4.5, [10.0, 0.0], [0.0, 10.0]),
        ]);
        let clf = ModelClassifier::from_model(model).expect("valid");
        assert_eq!(clf.estimator_name(), "random forest");

        let [_, low] = clf.predict_proba(&features_with(2, 2.0)).unwrap();
        assert!((low - 0.05).abs() < 1e-12);
        let [_, mid] = clf.predict_proba(&features_with(2, 4.0)).unwrap();
        assert!((mid - 0.45).abs() < 1e-12);
        let [_, high] = clf.predict_proba(&features_with(2, 5.0)).unwrap();
        assert!((high - 0.95).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_backward_child_links() {
        let mut tree = stump(2, 3.5, [1.0, 0.0], [0.0, 1.0]);
        tree.nodes[0].right = Some(0);
        let err = ModelClassifier::from_model(forest_model(vec![tree])).unwrap_err();
        assert!(matches!(err, ClassifierError::Inference(_)));
    }

    #[test]
    fn test_rejects_wrong_coefficient_count() {
        let mut model = tirads_model(1.0, 0.0);
        if let Estimator::LogisticRegression(lr) = &mut model.estimator {
            lr.coefficients.pop();
        }
        assert!(ModelClassifier::from_model(model).is_err());
    }

    #[test]
    fn test_feature_mismatch() {
        let mut model = tirads_model(1.0, 0.0);
        model.feature_names.swap(21, 22);
        let err = ModelClassifier::from_model(model).unwrap_err();
        assert!(matches!(err, ClassifierError::FeatureMismatch { .. }));
        assert!(err.is_load_error());
    }

    #[test]
    fn test_wrong_vector_length() {
        let clf = ModelClassifier::from_model(tirads_model(1.0, 0.0)).unwrap();
        let err = clf.predict_proba(&[1.0, 2.0]).unwrap_err();
        assert!(!err.is_load_error());
    }

    #[test]
    fn test_load_from_directory() {
        let temp = tempdir().expect("tempdir");
        write_model(temp.path(), &tirads_model(1.0, -3.0));

        let clf = ModelClassifier::load(temp.path(), false).expect("load");
        assert_eq!(clf.source(), temp.path().join(MODEL_FILE));
        assert_eq!(clf.feature_names().len(), FIELD_COUNT);
    }

    #[test]
    fn test_missing_artifact() {
        let temp = tempdir().expect("tempdir");
        let err = ModelClassifier::load(temp.path(), false).unwrap_err();
        assert!(matches!(err, ClassifierError::ArtifactMissing { .. }));

        let err = ModelClassifier::load(&temp.path().join("nope.json"), false).unwrap_err();
        assert!(matches!(err, ClassifierError::ArtifactMissing { .. }));
    }

    #[test]
    fn test_malformed_artifact() {
        let temp = tempdir().expect("tempdir");
        fs::write(temp.path().join(MODEL_FILE), b"{ not json").unwrap();
        let err = ModelClassifier::load(temp.path(), false).unwrap_err();
        assert!(matches!(err, ClassifierError::ArtifactLoad { .. }));
    }

    #[test]
    fn test_unsupported_version_is_load_error() {
        let temp = tempdir().expect("tempdir");
        let mut model = tirads_model(1.0, 0.0);
        model.format_version = 2;
        write_model(temp.path(), &model);
        let err = ModelClassifier::load(temp.path(), false).unwrap_err();
        assert!(matches!(err, ClassifierError::ArtifactLoad { .. }));
    }

    #[test]
    fn test_written_manifest_verifies_then_detects_tampering() {
        let temp = tempdir().expect("tempdir");
        let path = write_model(temp.path(), &tirads_model(1.0, -3.0));

        let manifest = IntegrityManifest::for_model(&path, &[]).expect("hash");
        assert_eq!(manifest.version, MANIFEST_VERSION);
        assert_eq!(manifest.files.len(), 1);
        let written = manifest.write_for(&path).expect("write manifest");
        assert_eq!(written, temp.path().join(MANIFEST_FILE));

        let stored: IntegrityManifest =
            serde_json::from_slice(&fs::read(&written).unwrap()).expect("parse");
        assert_eq!(stored, manifest);
        assert!(ModelClassifier::load(temp.path(), true).is_ok());

        // Tamper with the model after hashing.
        write_model(temp.path(), &tirads_model(5.0, -3.0));
        let err = ModelClassifier::load(temp.path(), true).unwrap_err();
        assert!(matches!(err, ClassifierError::ArtifactLoad { .. }));
        assert!(err.to_string().contains("hash mismatch for model.json"));
    }

    #[test]
    fn test_manifest_covers_extra_files() {
        let temp = tempdir().expect("tempdir");
        let path = write_model(temp.path(), &tirads_model(1.0, -3.0));
        fs::write(temp.path().join("training.txt"), b"cohort 2024").unwrap();

        let manifest =
            IntegrityManifest::for_model(&path, &["training.txt".to_string()]).expect("hash");
        manifest.write_for(&path).expect("write manifest");
        assert!(ModelClassifier::load(&path, false).is_ok());

        fs::write(temp.path().join("training.txt"), b"cohort 2025").unwrap();
        let err = ModelClassifier::load(&path, false).unwrap_err();
        assert!(err.to_string().contains("hash mismatch for training.txt"));
    }

    #[test]
    fn test_manifest_refuses_bad_extras() {
        let temp = tempdir().expect("tempdir");
        let path = write_model(temp.path(), &tirads_model(1.0, -3.0));

        let err = IntegrityManifest::for_model(&path, &[MANIFEST_FILE.to_string()]).unwrap_err();
        assert!(matches!(err, ThyrodxError::Validation(_)));

        let err = IntegrityManifest::for_model(&path, &["absent.bin".to_string()]).unwrap_err();
        assert!(matches!(err, ThyrodxError::Io(_)));
    }

    #[test]
    fn test_required_manifest() {
        let temp = tempdir().expect("tempdir");
        write_model(temp.path(), &tirads_model(1.0, -3.0));
        let err = ModelClassifier::load(temp.path(), true).unwrap_err();
        assert!(matches!(err, ClassifierError::ArtifactLoad { .. }));
    }

    #[test]
    fn test_manifest_must_list_model() {
        let temp = tempdir().expect("tempdir");
        write_model(temp.path(), &tirads_model(1.0, -3.0));
        let manifest = IntegrityManifest {
            version: MANIFEST_VERSION,
            files: BTreeMap::new(),
        };
        fs::write(
            temp.path().join(MANIFEST_FILE),
            serde_json::to_vec(&manifest).unwrap(),
        )
        .unwrap();
        assert!(ModelClassifier::load(temp.path(), false).is_err());
    }

    #[test]
    fn test_category_codes_from_artifact() {
        let mut model = tirads_model(1.0, 0.0);
        model.category_codes.insert(
            "usg_vascularity".into(),
            BTreeMap::from([
                ("None".into(), 0),
                ("Peripheral".into(), 1),
                ("Intranodular".into(), 2),
            ]),
        );
        let clf = ModelClassifier::from_model(model).unwrap();
        assert_eq!(clf.label_codes().code("usg_vascularity", "Intranodular"), Some(2));

        let mut bad = tirads_model(1.0, 0.0);
        bad.category_codes
            .insert("usg_vascularity".into(), BTreeMap::from([("None".into(), 0)]));
        assert!(ModelClassifier::from_model(bad).is_err());
    }

    #[test]
    fn test_estimator_json_shape() {
        let json = r#"{
            "format_version": 1,
            "feature_names": FEATURES,
            "estimator": {
                "type": "random_forest",
                "trees": [ { "nodes": [ { "value": [1.0, 3.0] } ] } ]
            }
        }"#
        .replace("FEATURES", &serde_json::to_string(&field_names()).unwrap());
        let model: ExportedModel = serde_json::from_str(&json).expect("parse");
        let clf = ModelClassifier::from_model(model).expect("valid");
        let [_, p1] = clf.predict_proba(&vec![0.0; FIELD_COUNT]).unwrap();
        assert!((p1 - 0.75).abs() < 1e-12);
    }
}

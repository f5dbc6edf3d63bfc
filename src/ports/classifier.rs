//! Classifier port: Trait for the externally trained malignancy model.
//!
//! This trait abstracts the model artifact format from the application
//! logic. Implementations are loaded once and never mutated afterwards.

use std::path::PathBuf;

use crate::domain::record::field_names;
use crate::domain::LabelCodes;

/// Errors raised while loading or running a classifier.
#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    /// The artifact file does not exist.
    #[error("Model artifact not found at {}", .path.display())]
    ArtifactMissing { path: PathBuf },

    /// The artifact exists but cannot be used.
    #[error("Failed to load model artifact {}: {reason}", .path.display())]
    ArtifactLoad { path: PathBuf, reason: String },

    /// The artifact was trained on a different feature set or order.
    #[error(
        "Model features do not match the clinical record: expected {expected:?}, found {found:?}"
    )]
    FeatureMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },

    #[error("Inference failed: {0}")]
    Inference(String),
}

impl ClassifierError {
    /// Whether the error happened while loading the artifact.
    #[must_use]
    pub fn is_load_error(&self) -> bool {
        !matches!(self, Self::Inference(_))
    }
}

/// Check that `names` are the clinical record fields, in record order.
///
/// # Errors
/// `FeatureMismatch` listing both orders otherwise.
pub fn ensure_record_features(names: &[String]) -> Result<(), ClassifierError> {
    let expected = field_names();
    if names.len() == expected.len() && names.iter().zip(expected).all(|(a, b)| a == b) {
        return Ok(());
    }
    Err(ClassifierError::FeatureMismatch {
        expected: expected.iter().map(|s| (*s).to_string()).collect(),
        found: names.to_vec(),
    })
}

/// Trait for binary malignancy classifiers.
///
/// Implementations provide:
/// - The feature names (and order) they were trained on
/// - The label codes used for categorical-label fields
/// - Class probabilities for an encoded feature vector
pub trait Classifier: Send + Sync {
    /// Feature names in training order.
    fn feature_names(&self) -> &[String];

    /// Codes for fields whose record value is a label.
    fn label_codes(&self) -> &LabelCodes;

    /// Class probabilities `[P(benign), P(malignant)]`.
    ///
    /// # Errors
    /// Returns `ClassifierError::Inference` if the vector has the wrong
    /// length or the model produces a non-finite probability.
    fn predict_proba(&self, features: &[f64]) -> Result<[f64; 2], ClassifierError>;

    /// Predicted class label (0 = benign, 1 = malignant).
    ///
    /// # Errors
    /// Same as [`Classifier::predict_proba`].
    fn predict(&self, features: &[f64]) -> Result<u8, ClassifierError> {
        let [p0, p1] = self.predict_proba(features)?;
        Ok(u8::from(p1 > p0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_names() -> Vec<String> {
        field_names().iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_record_features_accepted() {
        assert!(ensure_record_features(&record_names()).is_ok());
    }

    #[test]
    fn test_reordered_or_short_features_rejected() {
        let mut swapped = record_names();
        swapped.swap(0, 1);
        let err = ensure_record_features(&swapped).unwrap_err();
        assert!(err.is_load_error());
        match err {
            ClassifierError::FeatureMismatch { expected, found } => {
                assert_eq!(expected, record_names());
                assert_eq!(found, swapped);
            }
            other => panic!("unexpected error: {other}"),
        }

        let short = record_names()[..5].to_vec();
        assert!(ensure_record_features(&short).is_err());
    }
}

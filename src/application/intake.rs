//! Intake service: Turns a filled-in form into a submission.
//!
//! This service coordinates:
//! - Range validation of the raw form values
//! - Record assembly
//! - Feature encoding and prediction (diagnose mode only)

use std::sync::Arc;

use crate::config::Mode;
use crate::domain::{ClinicalInput, ClinicalRecord, Prediction, Submission};
use crate::ports::{ensure_record_features, Classifier, ClassifierError};
use crate::{Result, ThyrodxError};

/// Service for processing form submissions.
///
/// Without a classifier the service runs in collect mode and only
/// assembles the record. The classifier is shared read-only.
pub struct IntakeService<C>
where
    C: Classifier,
{
    classifier: Option<Arc<C>>,
}

impl<C> IntakeService<C>
where
    C: Classifier,
{
    /// Create a service that assembles records without predicting.
    #[must_use]
    pub fn collect_only() -> Self {
        Self { classifier: None }
    }

    /// Create a service that predicts with `classifier`.
    ///
    /// # Errors
    /// `FeatureMismatch` if the classifier was not trained on the clinical
    /// record fields in record order.
    pub fn with_classifier(classifier: Arc<C>) -> std::result::Result<Self, ClassifierError> {
        ensure_record_features(classifier.feature_names())?;
        Ok(Self {
            classifier: Some(classifier),
        })
    }

    #[must_use]
    pub fn mode(&self) -> Mode {
        if self.classifier.is_some() {
            Mode::Diagnose
        } else {
            Mode::Collect
        }
    }

    /// Validate, assemble and (in diagnose mode) predict.
    ///
    /// # Errors
    /// `Validation` listing every out-of-range field, or the classifier's
    /// error if prediction fails.
    pub fn submit(&self, input: &ClinicalInput) -> Result<Submission> {
        input
            .validate()
            .map_err(|errors| ThyrodxError::Validation(errors.join("; ")))?;

        let record = input.assemble();
        tracing::debug!("Assembled record with {} fields", record.len());

        let prediction = match &self.classifier {
            Some(_) => Some(self.predict(&record)?),
            None => None,
        };

        tracing::info!("Submission accepted (mode={})", self.mode());
        Ok(Submission::new(record, prediction))
    }

    /// Run the classifier on an assembled record.
    ///
    /// # Errors
    /// `Validation` in collect mode; `Classifier` if encoding or inference
    /// fails.
    pub fn predict(&self, record: &ClinicalRecord) -> Result<Prediction> {
        let classifier = self.classifier.as_ref().ok_or_else(|| {
            ThyrodxError::Validation("No classifier loaded (collect mode)".to_string())
        })?;

        let features = record
            .to_features(classifier.label_codes())
            .map_err(ClassifierError::Inference)?;

        tracing::debug!("Running classifier on {} features", features.len());
        let [_, p1] = classifier.predict_proba(&features)?;
        let prediction = Prediction::from_probability(p1);

        tracing::info!("Prediction complete: verdict={}", prediction.verdict);
        Ok(prediction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::model::tests::tirads_model;
    use crate::adapters::ModelClassifier;
    use crate::domain::record::field_names;
    use crate::domain::{LabelCodes, Verdict};

    /// Classifier reporting arbitrary feature names and a fixed probability.
    struct FixedClassifier {
        names: Vec<String>,
        codes: LabelCodes,
    }

    impl FixedClassifier {
        fn new(names: Vec<String>) -> Self {
            Self {
                names,
                codes: LabelCodes::default(),
            }
        }
    }

    impl Classifier for FixedClassifier {
        fn feature_names(&self) -> &[String] {
            &self.names
        }

        fn label_codes(&self) -> &LabelCodes {
            &self.codes
        }

        fn predict_proba(
            &self,
            _features: &[f64],
        ) -> std::result::Result<[f64; 2], ClassifierError> {
            Ok([0.25, 0.75])
        }
    }

    fn record_names() -> Vec<String> {
        field_names().iter().map(|s| (*s).to_string()).collect()
    }

    fn service(weight: f64, intercept: f64) -> IntakeService<ModelClassifier> {
        let clf = ModelClassifier::from_model(tirads_model(weight, intercept)).expect("valid");
        IntakeService::with_classifier(Arc::new(clf)).expect("record features")
    }

    #[test]
    fn test_collect_mode_has_no_prediction() {
        let svc = IntakeService::<ModelClassifier>::collect_only();
        assert_eq!(svc.mode(), Mode::Collect);

        let submission = svc.submit(&ClinicalInput::sample()).expect("submit");
        assert!(submission.prediction.is_none());
        assert_eq!(submission.record, ClinicalInput::sample().assemble());
        assert!(svc.predict(&submission.record).is_err());
    }

    #[test]
    fn test_diagnose_is_deterministic() {
        let svc = service(1.0, -3.0);
        assert_eq!(svc.mode(), Mode::Diagnose);

        let a = svc.submit(&ClinicalInput::sample()).unwrap().prediction.unwrap();
        let b = svc.submit(&ClinicalInput::sample()).unwrap().prediction.unwrap();
        assert_eq!(a, b);
        // tirads 3 with weight 1 and intercept -3 sits on the decision boundary.
        assert!((a.percentage - 50.0).abs() < 1e-9);
        assert_eq!(a.verdict, Verdict::Benign);
    }

    #[test]
    fn test_high_risk_is_malignant() {
        let svc = service(10.0, -20.0);
        let input = ClinicalInput {
            usg_tirads: 5,
            ..ClinicalInput::sample()
        };
        let prediction = svc.submit(&input).unwrap().prediction.unwrap();
        assert!(prediction.percentage >= 98.0);
        assert_eq!(prediction.verdict, Verdict::Malignant);
    }

    #[test]
    fn test_invalid_input_is_rejected() {
        let svc = service(1.0, -3.0);
        let input = ClinicalInput {
            age: 130,
            ..ClinicalInput::sample()
        };
        let err = svc.submit(&input).unwrap_err();
        assert!(matches!(err, ThyrodxError::Validation(_)));
        assert!(err.to_string().contains("Age"));
    }

    #[test]
    fn test_any_classifier_must_match_record_order() {
        let mut reversed = record_names();
        reversed.reverse();
        let result = IntakeService::with_classifier(Arc::new(FixedClassifier::new(reversed)));
        assert!(matches!(result, Err(ClassifierError::FeatureMismatch { .. })));

        let short = record_names()[1..].to_vec();
        let result = IntakeService::with_classifier(Arc::new(FixedClassifier::new(short)));
        assert!(matches!(result, Err(ClassifierError::FeatureMismatch { .. })));
    }

    #[test]
    fn test_matching_classifier_is_used() {
        let svc = IntakeService::with_classifier(Arc::new(FixedClassifier::new(record_names())))
            .expect("record features");
        let prediction = svc.submit(&ClinicalInput::sample()).unwrap().prediction.unwrap();
        assert!((prediction.percentage - 75.0).abs() < 1e-9);
        assert_eq!(prediction.verdict, Verdict::Benign);
    }
}

//! Prediction and submission result types.
//!
//! A prediction is the classifier's class-1 (malignant) probability turned
//! into a percentage and a binary verdict by a fixed threshold.

use serde::{Deserialize, Serialize};

use super::record::ClinicalRecord;

/// Percentage at or above which a nodule is classified as malignant.
pub const MALIGNANCY_THRESHOLD_PERCENT: f64 = 98.0;

/// Binary classification of a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    Benign,
    Malignant,
}

impl Verdict {
    /// Classify a malignancy percentage against the fixed threshold.
    #[must_use]
    pub fn from_percentage(percentage: f64) -> Self {
        if percentage >= MALIGNANCY_THRESHOLD_PERCENT {
            Self::Malignant
        } else {
            Self::Benign
        }
    }

    /// Get a human-readable description.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Benign => "Below the malignancy threshold",
            Self::Malignant => "At or above the malignancy threshold - specialist review advised",
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Benign => write!(f, "Benign"),
            Self::Malignant => write!(f, "Malignant"),
        }
    }
}

/// Classifier output for one record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Class-1 probability (0.0 to 1.0)
    pub probability: f64,

    /// `probability * 100`
    pub percentage: f64,

    pub verdict: Verdict,
}

impl Prediction {
    /// Build a prediction from a class-1 probability.
    #[must_use]
    pub fn from_probability(probability: f64) -> Self {
        let percentage = probability * 100.0;
        Self {
            probability,
            percentage,
            verdict: Verdict::from_percentage(percentage),
        }
    }
}

/// One submitted form: the assembled record and, in diagnose mode, its
/// prediction.
#[derive(Debug, Clone, Serialize)]
pub struct Submission {
    pub record: ClinicalRecord,

    /// `None` in collect mode.
    pub prediction: Option<Prediction>,

    pub submitted_at: chrono::DateTime<chrono::Utc>,
}

impl Submission {
    #[must_use]
    pub fn new(record: ClinicalRecord, prediction: Option<Prediction>) -> Self {
        Self {
            record,
            prediction,
            submitted_at: chrono::Utc::now(),
        }
    }
}

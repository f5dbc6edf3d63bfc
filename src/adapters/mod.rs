//! Adapters layer: Concrete implementations of ports.
//!
//! - `model`: JSON model export loader implementing `Classifier`
//! - `sanitize`: identifier and clinical-value filtering for logs

pub mod model;
pub mod sanitize;

pub use model::ModelClassifier;

//! # thyrodx
//!
//! Thyroid nodule work-up form with an optional malignancy classifier.
//!
//! This crate provides:
//! - A terminal form for demographics, ultrasound, cytology and blood markers
//! - Central label-to-code tables and a record assembler
//! - A classifier port with a JSON model-export adapter
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Core clinical types (field catalogue, record, prediction)
//! - `ports`: Trait definitions for external operations
//! - `adapters`: Concrete implementations (model loader, log sanitizer)
//! - `application`: Use cases orchestrating domain and ports
//! - `tui`: Terminal user interface

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod tui;

pub use domain::{ClinicalInput, ClinicalRecord, Prediction, Submission, Verdict};

/// Result type for thyrodx operations
pub type Result<T> = std::result::Result<T, ThyrodxError>;

/// Main error type for thyrodx
#[derive(Debug, thiserror::Error)]
pub enum ThyrodxError {
    #[error(transparent)]
    Classifier(#[from] ports::ClassifierError),

    #[error("Invalid clinical data: {0}")]
    Validation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

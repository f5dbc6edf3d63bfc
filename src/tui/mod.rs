//! TUI module: Terminal User Interface using Ratatui.
//!
//! Provides a medical-themed interface for:
//! - Clinical data entry grouped by section
//! - Record summary and malignancy prediction

mod app;
mod styles;
mod ui;

pub use app::App;
pub use styles::MedicalTheme;

//! Domain layer: Core clinical types and logic.
//!
//! Pure Rust types with no I/O. The field catalogue, the label-to-code
//! tables, the record assembler and the malignancy threshold live here.

mod diagnosis;
pub mod encoding;
pub mod record;

pub use diagnosis::{Prediction, Submission, Verdict, MALIGNANCY_THRESHOLD_PERCENT};
pub use encoding::{Categorical, LabelCodes};
pub use record::{
    ClinicalInput, ClinicalRecord, FieldKind, FieldSpec, FieldValue, RawValue, RecordEntry,
    Section, FIELDS, FIELD_COUNT,
};

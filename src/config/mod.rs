//! Extractor configuration: JSON spec, validation rules, diagnostic codes.

pub mod error_code;
pub mod spec;
pub mod validation;

pub use error_code::{ErrorCode, SpecError};
pub use spec::{ExtractorSpec, LimitsSpec, NerSpec};
pub use validation::{Severity, ValidationEngine, ValidationReport, ValidationRule};

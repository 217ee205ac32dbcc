//! Input and layout validation.

mod validate;

pub use validate::{quick_validate, validate_job, validate_part, validate_sheet_layout, ValidationResult};

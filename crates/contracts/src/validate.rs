//! Schema-constraint validation shared by every boundary type.

use thiserror::Error;

/// Maximum length of any identifier.
pub const MAX_ID_LEN: usize = 64;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{field}: '{value}' does not match ^[a-zA-Z0-9_-]{{1,64}}$")]
    InvalidId { field: &'static str, value: String },
    #[error("{field}: length {len} outside {min}..={max}")]
    LengthOutOfRange {
        field: &'static str,
        len: usize,
        min: usize,
        max: usize,
    },
    #[error("{field}: {value} outside [0, 1]")]
    OutsideUnitInterval { field: &'static str, value: f64 },
    #[error("{field}: at least one entry is required")]
    Empty { field: &'static str },
    #[error("duplicate entity id '{id}'")]
    DuplicateEntityId { id: String },
    #[error("doctrine_snippets: {len} exceeds the cap of {max}")]
    TooManySnippets { len: usize, max: usize },
    #[error("visible_slice for '{persona_id}' does not contain the persona's own entity")]
    SelfNotVisible { persona_id: String },
}

/// Whether `value` matches `^[a-zA-Z0-9_-]{1,64}$`.
pub fn is_valid_id(value: &str) -> bool {
    !value.is_empty()
        && value.len() <= MAX_ID_LEN
        && value
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
}

pub fn validate_id(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if is_valid_id(value) {
        Ok(())
    } else {
        Err(ValidationError::InvalidId {
            field,
            value: value.to_string(),
        })
    }
}

/// Character-count bound check for free-text fields.
pub fn validate_text(
    field: &'static str,
    value: &str,
    min: usize,
    max: usize,
) -> Result<(), ValidationError> {
    let len = value.chars().count();
    if len < min || len > max {
        return Err(ValidationError::LengthOutOfRange {
            field,
            len,
            min,
            max,
        });
    }
    Ok(())
}

pub fn validate_unit_interval(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::OutsideUnitInterval { field, value })
    }
}

//! # Validation Errors
//!
//! Every validated constructor in this crate reports failures through
//! [`ValidationError`]. The API layer maps it to a 422 response.

use thiserror::Error;

/// A domain value failed validation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// A required text field was missing or blank.
    #[error("{field} must not be empty")]
    Empty { field: &'static str },

    /// A text field exceeded its maximum length.
    #[error("{field} must not exceed {max} characters")]
    TooLong { field: &'static str, max: usize },

    /// A numeric field was outside its accepted range.
    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        min: f64,
        max: f64,
        value: f64,
    },

    /// A field contained characters outside its accepted alphabet.
    #[error("{field} contains invalid character {found:?}")]
    InvalidCharacter { field: &'static str, found: char },

    /// An enumerated field had an unknown label.
    #[error("unknown {field} {value:?}; expected one of {expected}")]
    UnknownVariant {
        field: &'static str,
        value: String,
        expected: &'static str,
    },
}

impl ValidationError {
    /// Name of the offending field.
    pub fn field(&self) -> &'static str {
        match self {
            Self::Empty { field }
            | Self::TooLong { field, .. }
            | Self::OutOfRange { field, .. }
            | Self::InvalidCharacter { field, .. }
            | Self::UnknownVariant { field, .. } => field,
        }
    }
}

/// Reject blank strings. Returns the trimmed value on success.
pub fn require_text<'a>(field: &'static str, value: &'a str) -> Result<&'a str, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty { field });
    }
    Ok(trimmed)
}

//! # Phone Numbers
//!
//! The phone number is the natural key of a customer. Rentals carry a free
//! `contact` field; when it parses as a [`PhoneNumber`] the rental is linked
//! to the customer with that phone.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

const MAX_LEN: usize = 32;

/// A trimmed, non-empty phone number made of digits and the usual
/// separators (`+`, space, `-`, `(`, `)`, `.`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PhoneNumber(String);

impl PhoneNumber {
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::Empty { field: "phone" });
        }
        if trimmed.chars().count() > MAX_LEN {
            return Err(ValidationError::TooLong {
                field: "phone",
                max: MAX_LEN,
            });
        }
        if let Some(found) = trimmed
            .chars()
            .find(|c| !(c.is_ascii_digit() || matches!(c, '+' | ' ' | '-' | '(' | ')' | '.')))
        {
            return Err(ValidationError::InvalidCharacter {
                field: "phone",
                found,
            });
        }
        if !trimmed.chars().any(|c| c.is_ascii_digit()) {
            return Err(ValidationError::Empty { field: "phone" });
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl TryFrom<String> for PhoneNumber {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PhoneNumber> for String {
    fn from(value: PhoneNumber) -> Self {
        value.0
    }
}

impl std::fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

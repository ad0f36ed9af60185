// Validation errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which check a field failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Constraint {
    Required,
    MinLength,
    MaxLength,
    Pattern,
    Custom,
}

/// Validation error for a single field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationError {
    /// Field name that failed validation
    pub field: String,

    /// Error message
    pub message: String,

    /// Validation constraint that failed
    pub constraint: Constraint,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>, constraint: Constraint) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            constraint,
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

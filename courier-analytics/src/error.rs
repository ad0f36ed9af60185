//! Analytics error types

use thiserror::Error;

/// Errors that can occur when exporting analytics
#[derive(Debug, Error)]
pub enum AnalyticsError {
    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for AnalyticsError {
    fn from(err: serde_json::Error) -> Self {
        AnalyticsError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AnalyticsError>;

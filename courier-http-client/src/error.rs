//! Transport error types.

use courier_core::{ApiError, ErrorKind, NetworkSignal};
use std::time::Duration;
use thiserror::Error;

/// Failures below the HTTP layer, before any response was received.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// Request timed out.
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// Connection refused, host unreachable, DNS failure.
    #[error("Connection error: {0}")]
    Connect(String),

    /// Any other network failure.
    #[error("Network error: {0}")]
    Network(String),

    /// The request could not be built.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(Duration::ZERO)
        } else if err.is_connect() {
            Self::Connect(err.to_string())
        } else if err.is_builder() {
            Self::InvalidRequest(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

impl From<url::ParseError> for TransportError {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidRequest(err.to_string())
    }
}

impl From<TransportError> for ApiError {
    fn from(err: TransportError) -> Self {
        let message = err.to_string();
        match err {
            TransportError::Timeout(_) => ApiError::from_network(NetworkSignal::Timeout, message),
            TransportError::Connect(_) => ApiError::from_network(NetworkSignal::Connection, message),
            TransportError::Network(detail) => {
                ApiError::from_network(NetworkSignal::classify(&detail), message)
            }
            TransportError::InvalidRequest(_) => ApiError::new(ErrorKind::UnknownError, message),
        }
    }
}

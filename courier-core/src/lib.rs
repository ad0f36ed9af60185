//! # Courier Core
//!
//! Shared vocabulary for the Courier request layer: the closed error
//! taxonomy, backend service names, per-request metadata, and the server
//! response envelope.
//!
//! ```
//! use courier_core::{ApiError, ErrorKind};
//!
//! let error = ApiError::from_http_response(503, None);
//! assert_eq!(error.code(), ErrorKind::ServerError);
//! assert!(error.is_retryable());
//! ```

mod error;
mod request;
mod response;
mod service;

pub use error::{ApiError, ErrorKind, NetworkSignal};
pub use request::{RequestMetadata, generate_request_id};
pub use response::{ApiResponse, ResponseStatus};
pub use service::{ServiceName, UnknownService};

/// Result type for request-layer operations.
pub type Result<T> = std::result::Result<T, ApiError>;

//! Per-dispatch request metadata.

use crate::ServiceName;
use chrono::{DateTime, Utc};
use http::Method;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity of one dispatched request.
///
/// Created when the request is dispatched and handed to logging and
/// analytics. Lives only for the process lifetime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestMetadata {
    pub request_id: String,
    pub service: ServiceName,
    pub endpoint: String,
    pub method: String,
    pub start_time: DateTime<Utc>,
}

impl RequestMetadata {
    /// Create metadata with a fresh request id.
    pub fn new(service: ServiceName, method: &Method, endpoint: impl Into<String>) -> Self {
        Self {
            request_id: generate_request_id(),
            service,
            endpoint: endpoint.into(),
            method: method.as_str().to_string(),
            start_time: Utc::now(),
        }
    }
}

/// Generate a unique request id.
pub fn generate_request_id() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_ids_are_unique() {
        let a = RequestMetadata::new(ServiceName::User, &Method::GET, "profile");
        let b = RequestMetadata::new(ServiceName::User, &Method::GET, "profile");
        assert_ne!(a.request_id, b.request_id);
        assert_eq!(a.method, "GET");
    }
}

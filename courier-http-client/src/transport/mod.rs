//! Transport strategy: how a built request reaches a backend service.
//!
//! The client owns one transport per service, created lazily through a
//! [`TransportFactory`]. [`ReqwestTransport`] talks HTTP; [`MockTransport`]
//! answers from an in-process route table.

mod mock;
mod network;

pub use self::mock::{MockServiceTransport, MockTransport, RecordedRequest};
pub use self::network::{ReqwestTransport, ReqwestTransportFactory};

use crate::config::ServiceSettings;
use crate::error::TransportError;
use async_trait::async_trait;
use bytes::Bytes;
use http::Method;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// One attempt, fully resolved except for the service's fixed headers.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportRequest {
    pub method: Method,
    /// Path relative to the service base address.
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
    pub timeout: Duration,
}

impl TransportRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            headers: Vec::new(),
            body: None,
            timeout: Duration::from_secs(30),
        }
    }

    /// Case-insensitive header lookup; the last value wins.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .rev()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Raw response from a transport.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl TransportResponse {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    /// Response with a JSON body.
    pub fn json(status: u16, body: &Value) -> Self {
        Self {
            status,
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
            body: Bytes::from(body.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body parsed as JSON; `None` when empty or not JSON.
    pub fn body_json(&self) -> Option<Value> {
        if self.body.is_empty() {
            return None;
        }
        serde_json::from_slice(&self.body).ok()
    }
}

/// Sends requests to one backend service.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError>;
}

/// Builds the transport for a service on first use.
pub trait TransportFactory: Send + Sync {
    fn create(&self, settings: &ServiceSettings) -> Result<Arc<dyn Transport>, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_response_json() {
        let response = TransportResponse::json(200, &json!({"ok": true}));
        assert!(response.is_success());
        assert_eq!(response.body_json(), Some(json!({"ok": true})));

        let empty = TransportResponse::new(204, Bytes::new());
        assert_eq!(empty.body_json(), None);

        let html = TransportResponse::new(502, "<html>bad gateway</html>");
        assert!(!html.is_success());
        assert_eq!(html.body_json(), None);
    }

    #[test]
    fn test_header_lookup() {
        let mut request = TransportRequest::new(Method::GET, "profile");
        request.headers.push(("authorization".into(), "Bearer a".into()));
        assert_eq!(request.header("Authorization"), Some("Bearer a"));
        assert_eq!(request.header("Cookie"), None);
    }
}

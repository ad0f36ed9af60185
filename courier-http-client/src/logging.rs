//! Debug logging of requests and responses with secret redaction.

use crate::transport::TransportRequest;
use courier_core::{ApiError, RequestMetadata};
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::debug;

const REDACTED: &str = "[REDACTED]";

const SENSITIVE_HEADERS: &[&str] = &["authorization", "cookie", "x-api-key"];

fn is_sensitive_key(key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    key == "otp" || ["password", "token", "secret"].iter().any(|s| key.contains(s))
}

/// Copy of `headers` with credential values replaced.
pub fn redact_headers(headers: &[(String, String)]) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            if SENSITIVE_HEADERS.contains(&name.to_ascii_lowercase().as_str()) {
                (name.clone(), REDACTED.to_string())
            } else {
                (name.clone(), value.clone())
            }
        })
        .collect()
}

/// Copy of `body` with password, token, secret and otp fields replaced at any depth.
pub fn redact_body(body: &Value) -> Value {
    match body {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, value)| {
                    let value = if is_sensitive_key(key) {
                        Value::String(REDACTED.to_string())
                    } else {
                        redact_body(value)
                    };
                    (key.clone(), value)
                })
                .collect::<Map<_, _>>(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(redact_body).collect()),
        other => other.clone(),
    }
}

/// Emits request/response debug events when enabled.
#[derive(Debug, Clone, Copy)]
pub struct RequestLogger {
    enabled: bool,
}

impl RequestLogger {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn log_request(&self, metadata: &RequestMetadata, request: &TransportRequest, attempt: u32) {
        if !self.enabled {
            return;
        }
        let headers = redact_headers(&request.headers);
        let body = request.body.as_ref().map(redact_body);
        debug!(
            request_id = %metadata.request_id,
            service = %metadata.service,
            method = %request.method,
            path = %request.path,
            attempt,
            headers = ?headers,
            body = ?body,
            "sending request"
        );
    }

    pub fn log_response(
        &self,
        metadata: &RequestMetadata,
        status: u16,
        body: Option<&Value>,
        elapsed: Duration,
    ) {
        if !self.enabled {
            return;
        }
        let body = body.map(redact_body);
        debug!(
            request_id = %metadata.request_id,
            service = %metadata.service,
            status,
            elapsed_ms = elapsed.as_millis() as u64,
            body = ?body,
            "received response"
        );
    }

    pub fn log_error(&self, metadata: &RequestMetadata, error: &ApiError) {
        if !self.enabled {
            return;
        }
        debug!(
            request_id = %metadata.request_id,
            service = %metadata.service,
            code = %error.code(),
            message = %error.message(),
            "request failed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_redact_headers() {
        let headers = vec![
            ("Authorization".to_string(), "Bearer abc".to_string()),
            ("X-Platform".to_string(), "ios".to_string()),
            ("x-api-key".to_string(), "k".to_string()),
        ];
        let redacted = redact_headers(&headers);

        assert_eq!(redacted[0].1, REDACTED);
        assert_eq!(redacted[1].1, "ios");
        assert_eq!(redacted[2].1, REDACTED);
    }

    #[test]
    fn test_redact_body_nested() {
        let body = json!({
            "email": "a@b.co",
            "password": "hunter22",
            "otp": "123456",
            "session": { "accessToken": "t", "refresh_token": "r", "user": "alice" },
            "items": [{ "clientSecret": "s" }]
        });
        let redacted = redact_body(&body);

        assert_eq!(redacted["email"], "a@b.co");
        assert_eq!(redacted["password"], REDACTED);
        assert_eq!(redacted["otp"], REDACTED);
        assert_eq!(redacted["session"]["accessToken"], REDACTED);
        assert_eq!(redacted["session"]["refresh_token"], REDACTED);
        assert_eq!(redacted["session"]["user"], "alice");
        assert_eq!(redacted["items"][0]["clientSecret"], REDACTED);
    }
}

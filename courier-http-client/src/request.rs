//! Request descriptor and builder.

use crate::HttpClient;
use courier_core::{ApiError, ErrorKind, ServiceName};
use http::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

/// Everything the client needs to dispatch one logical request.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    pub service: ServiceName,
    pub method: Method,
    /// Path relative to the service base address.
    pub path: String,
    pub body: Option<Value>,
    pub headers: Vec<(String, String)>,
    pub query: Vec<(String, String)>,
    /// Overrides the configured retry budget.
    pub retries: Option<u32>,
    /// Overrides the configured per-attempt timeout.
    pub timeout: Option<Duration>,
    /// Share one in-flight dispatch with identical requests.
    pub dedupe: bool,
}

impl RequestDescriptor {
    pub fn new(service: ServiceName, method: Method, path: impl Into<String>) -> Self {
        Self {
            service,
            method,
            path: path.into(),
            body: None,
            headers: Vec::new(),
            query: Vec::new(),
            retries: None,
            timeout: None,
            dedupe: false,
        }
    }

    /// Key shared by requests that may be deduplicated: `METHOD service/path`.
    pub fn dedupe_key(&self) -> String {
        let mut key = format!(
            "{} {}/{}",
            self.method,
            self.service,
            self.path.trim_start_matches('/')
        );
        if !self.query.is_empty() {
            let query: Vec<String> = self.query.iter().map(|(k, v)| format!("{k}={v}")).collect();
            key.push('?');
            key.push_str(&query.join("&"));
        }
        key
    }
}

/// Fluent builder returned by [`HttpClient::get`] and friends.
#[must_use = "requests do nothing until `send` is awaited"]
pub struct RequestBuilder<'a> {
    client: &'a HttpClient,
    descriptor: RequestDescriptor,
    error: Option<ApiError>,
}

impl<'a> RequestBuilder<'a> {
    pub(crate) fn new(client: &'a HttpClient, descriptor: RequestDescriptor) -> Self {
        Self {
            client,
            descriptor,
            error: None,
        }
    }

    /// Set the JSON body.
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Self {
        match serde_json::to_value(body) {
            Ok(value) => self.descriptor.body = Some(value),
            Err(e) => {
                self.error = Some(ApiError::new(
                    ErrorKind::InvalidInput,
                    format!("Failed to serialize request body: {e}"),
                ));
            }
        }
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.descriptor.headers.push((name.into(), value.into()));
        self
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.descriptor.query.push((key.into(), value.into()));
        self
    }

    pub fn retries(mut self, retries: u32) -> Self {
        self.descriptor.retries = Some(retries);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.descriptor.timeout = Some(timeout);
        self
    }

    pub fn dedupe(mut self) -> Self {
        self.descriptor.dedupe = true;
        self
    }

    /// The descriptor built so far.
    pub fn descriptor(&self) -> &RequestDescriptor {
        &self.descriptor
    }

    /// Dispatch and decode the JSON payload into `T`.
    pub async fn send<T: DeserializeOwned>(self) -> Result<T, ApiError> {
        if let Some(error) = self.error {
            return Err(error);
        }
        let value = self.client.request(self.descriptor).await?;
        serde_json::from_value(value).map_err(|e| {
            ApiError::new(
                ErrorKind::UnknownError,
                format!("Failed to decode response: {e}"),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedupe_key() {
        let descriptor = RequestDescriptor::new(ServiceName::Feed, Method::GET, "/posts");
        assert_eq!(descriptor.dedupe_key(), "GET feed/posts");

        let mut with_query = descriptor.clone();
        with_query.query.push(("page".into(), "2".into()));
        assert_eq!(with_query.dedupe_key(), "GET feed/posts?page=2");
    }
}

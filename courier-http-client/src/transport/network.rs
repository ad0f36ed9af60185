//! HTTP transport backed by `reqwest`.

use super::{Transport, TransportFactory, TransportRequest, TransportResponse};
use crate::config::ServiceSettings;
use crate::error::TransportError;
use async_trait::async_trait;
use http::{HeaderMap, HeaderName, HeaderValue};
use std::sync::Arc;
use url::Url;

/// Real HTTP transport for one service.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    base_url: Url,
}

impl ReqwestTransport {
    pub fn new(settings: &ServiceSettings) -> Result<Self, TransportError> {
        let mut headers = HeaderMap::new();
        for (name, value) in &settings.default_headers {
            let name = HeaderName::try_from(name.as_str())
                .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;
            let value = HeaderValue::try_from(value.as_str())
                .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;
            headers.insert(name, value);
        }

        let client = reqwest::Client::builder()
            .timeout(settings.timeout)
            .connect_timeout(settings.connect_timeout)
            .user_agent(&settings.user_agent)
            .default_headers(headers)
            .gzip(true)
            .brotli(true)
            .build()?;

        // `Url::join` replaces the last segment unless the base ends in '/'.
        let mut base = settings.base_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }

        Ok(Self {
            client,
            base_url: Url::parse(&base)?,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Absolute URL for `request`, query included.
    pub fn url_for(&self, request: &TransportRequest) -> Result<Url, TransportError> {
        let mut url = self.base_url.join(request.path.trim_start_matches('/'))?;
        if !request.query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &request.query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        let url = self.url_for(&request)?;
        let mut builder = self
            .client
            .request(request.method.clone(), url)
            .timeout(request.timeout);

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let timed = |e: reqwest::Error| match TransportError::from(e) {
            TransportError::Timeout(_) => TransportError::Timeout(request.timeout),
            other => other,
        };
        let response = builder.send().await.map_err(timed)?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(k, v)| Some((k.as_str().to_string(), v.to_str().ok()?.to_string())))
            .collect();
        let body = response.bytes().await.map_err(timed)?;

        Ok(TransportResponse {
            status,
            headers,
            body,
        })
    }
}

/// Creates a [`ReqwestTransport`] per service.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReqwestTransportFactory;

impl TransportFactory for ReqwestTransportFactory {
    fn create(&self, settings: &ServiceSettings) -> Result<Arc<dyn Transport>, TransportError> {
        Ok(Arc::new(ReqwestTransport::new(settings)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_core::ServiceName;
    use http::Method;
    use std::time::Duration;

    fn settings(base: &str) -> ServiceSettings {
        ServiceSettings {
            service: ServiceName::Auth,
            base_url: base.to_string(),
            timeout: Duration::from_secs(5),
            connect_timeout: Duration::from_secs(1),
            user_agent: "courier-test".to_string(),
            default_headers: vec![("Accept".to_string(), "application/json".to_string())],
        }
    }

    #[test]
    fn test_url_join_keeps_base_path() {
        let transport = ReqwestTransport::new(&settings("http://localhost:3000/api/auth")).unwrap();
        let mut request = TransportRequest::new(Method::POST, "/login");
        request.query.push(("next".into(), "a b".into()));

        let url = transport.url_for(&request).unwrap();
        assert_eq!(url.as_str(), "http://localhost:3000/api/auth/login?next=a+b");
    }

    #[test]
    fn test_invalid_base_url() {
        let err = ReqwestTransport::new(&settings("not a url")).unwrap_err();
        assert!(matches!(err, TransportError::InvalidRequest(_)));
    }
}

//! Service-aware HTTP client.

use crate::auth::is_public_endpoint;
use crate::circuit_breaker::{CircuitBreaker, CircuitState};
use crate::config::HttpClientConfig;
use crate::error::TransportError;
use crate::logging::RequestLogger;
use crate::request::{RequestBuilder, RequestDescriptor};
use crate::token::{InMemoryTokenStore, TokenRefresher, TokenStore};
use crate::transport::{MockTransport, ReqwestTransportFactory, Transport, TransportFactory, TransportRequest};
use courier_analytics::RequestAnalytics;
use courier_config::ApiConfig;
use courier_core::{ApiError, ErrorKind, RequestMetadata, ServiceName};
use courier_optimizer::RequestOptimizer;
use dashmap::DashMap;
use http::Method;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

struct ClientInner {
    config: HttpClientConfig,
    factory: Arc<dyn TransportFactory>,
    transports: RwLock<HashMap<ServiceName, Arc<dyn Transport>>>,
    tokens: Arc<dyn TokenStore>,
    analytics: Arc<RequestAnalytics>,
    optimizer: Option<RequestOptimizer<Value>>,
    refresher: RwLock<Option<Weak<dyn TokenRefresher>>>,
    refreshing: AtomicBool,
    breakers: DashMap<ServiceName, Arc<CircuitBreaker>>,
    logger: RequestLogger,
}

/// HTTP client that knows the backend services.
///
/// Cheap to clone; clones share transports, tokens and analytics.
#[derive(Clone)]
pub struct HttpClient {
    inner: Arc<ClientInner>,
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl HttpClient {
    /// Client with the default transport, an in-memory token store and
    /// fresh analytics.
    pub fn new(config: HttpClientConfig) -> Self {
        Self::builder(config).build()
    }

    pub fn from_api_config(config: &ApiConfig) -> Self {
        Self::new(HttpClientConfig::from(config))
    }

    pub fn builder(config: HttpClientConfig) -> HttpClientBuilder {
        HttpClientBuilder::new(config)
    }

    pub fn config(&self) -> &HttpClientConfig {
        &self.inner.config
    }

    pub fn analytics(&self) -> &Arc<RequestAnalytics> {
        &self.inner.analytics
    }

    pub fn token_store(&self) -> &Arc<dyn TokenStore> {
        &self.inner.tokens
    }

    pub fn optimizer(&self) -> Option<&RequestOptimizer<Value>> {
        self.inner.optimizer.as_ref()
    }

    /// Register the collaborator used to renew expired access tokens.
    ///
    /// Held weakly, so a service that owns this client can register itself.
    pub fn set_token_refresher<R: TokenRefresher + 'static>(&self, refresher: &Arc<R>) {
        let weak = Arc::downgrade(refresher);
        let weak: Weak<dyn TokenRefresher> = weak;
        *self.inner.refresher.write() = Some(weak);
    }

    /// Circuit state for `service`, when breakers are configured.
    pub fn circuit_state(&self, service: ServiceName) -> Option<CircuitState> {
        self.breaker(service).map(|b| b.state())
    }

    pub fn get(&self, service: ServiceName, path: impl Into<String>) -> RequestBuilder<'_> {
        self.method(service, Method::GET, path)
    }

    pub fn post(&self, service: ServiceName, path: impl Into<String>) -> RequestBuilder<'_> {
        self.method(service, Method::POST, path)
    }

    pub fn put(&self, service: ServiceName, path: impl Into<String>) -> RequestBuilder<'_> {
        self.method(service, Method::PUT, path)
    }

    pub fn patch(&self, service: ServiceName, path: impl Into<String>) -> RequestBuilder<'_> {
        self.method(service, Method::PATCH, path)
    }

    pub fn delete(&self, service: ServiceName, path: impl Into<String>) -> RequestBuilder<'_> {
        self.method(service, Method::DELETE, path)
    }

    fn method(&self, service: ServiceName, method: Method, path: impl Into<String>) -> RequestBuilder<'_> {
        RequestBuilder::new(self, RequestDescriptor::new(service, method, path))
    }

    /// Dispatch a request and return its JSON payload (`null` when empty).
    pub async fn request(&self, descriptor: RequestDescriptor) -> Result<Value, ApiError> {
        match (&self.inner.optimizer, descriptor.dedupe) {
            (Some(optimizer), true) => {
                let key = descriptor.dedupe_key();
                let client = self.clone();
                optimizer
                    .deduplicate(
                        key,
                        move || async move { client.dispatch(descriptor).await },
                        self.inner.config.dedupe_ttl,
                    )
                    .await
            }
            _ => self.dispatch(descriptor).await,
        }
    }

    async fn dispatch(&self, descriptor: RequestDescriptor) -> Result<Value, ApiError> {
        let metadata = RequestMetadata::new(descriptor.service, &descriptor.method, descriptor.path.clone());
        let analytics = &self.inner.analytics;
        analytics.track_request_start(&metadata);
        let mut unfinished = UnfinishedRequest {
            analytics,
            request_id: &metadata.request_id,
            armed: true,
        };

        let result = match self.execute(&descriptor, &metadata).await {
            Err(error) if error.code() == ErrorKind::TokenExpired => {
                self.recover_expired_token(&descriptor, &metadata, error).await
            }
            other => other,
        };
        unfinished.armed = false;

        match result {
            Ok((status, body)) => {
                analytics.track_request_end(&metadata.request_id, Some(status), true, None);
                Ok(body)
            }
            Err(error) => {
                analytics.track_request_end(
                    &metadata.request_id,
                    error.status_code(),
                    false,
                    Some(error.code()),
                );
                self.inner.logger.log_error(&metadata, &error);
                Err(error.with_request_id(metadata.request_id.clone()))
            }
        }
    }

    /// Attempt loop: retries retryable failures with backoff.
    async fn execute(
        &self,
        descriptor: &RequestDescriptor,
        metadata: &RequestMetadata,
    ) -> Result<(u16, Value), ApiError> {
        let config = &self.inner.config;
        let max_retries = descriptor.retries.unwrap_or(config.retry.max_retries);
        let timeout = descriptor.timeout.unwrap_or(config.timeout);
        let transport = self.transport(descriptor.service)?;
        let breaker = self.breaker(descriptor.service);

        let mut attempt = 0;
        loop {
            if let Some(breaker) = &breaker
                && !breaker.is_allowed()
            {
                return Err(ApiError::new(
                    ErrorKind::ConnectionError,
                    format!("Circuit open for service '{}'", descriptor.service),
                ));
            }

            let outcome = self
                .attempt(transport.as_ref(), descriptor, metadata, timeout, attempt)
                .await;

            if let Some(breaker) = &breaker {
                match &outcome {
                    Err(e) if e.is_retryable() => breaker.record_failure(),
                    _ => breaker.record_success(),
                }
            }

            match outcome {
                Err(error) if error.is_retryable() && attempt < max_retries => {
                    let delay = config.retry.delay_for_attempt(attempt);
                    debug!(
                        request_id = %metadata.request_id,
                        attempt = attempt + 1,
                        max_retries,
                        code = %error.code(),
                        delay_ms = delay.as_millis() as u64,
                        "retrying request"
                    );
                    self.inner.analytics.track_retry(&metadata.request_id);
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                other => return other,
            }
        }
    }

    async fn attempt(
        &self,
        transport: &dyn Transport,
        descriptor: &RequestDescriptor,
        metadata: &RequestMetadata,
        timeout: Duration,
        attempt: u32,
    ) -> Result<(u16, Value), ApiError> {
        let mut headers = descriptor.headers.clone();
        let has_auth = headers.iter().any(|(k, _)| k.eq_ignore_ascii_case("authorization"));
        if !has_auth && !is_public_endpoint(&descriptor.path) {
            match self.inner.tokens.get_access_token().await {
                Ok(Some(token)) => headers.push(("Authorization".to_string(), format!("Bearer {token}"))),
                Ok(None) => {}
                Err(e) => {
                    warn!(request_id = %metadata.request_id, error = %e, "token store read failed, sending without credentials");
                }
            }
        }

        let request = TransportRequest {
            method: descriptor.method.clone(),
            path: descriptor.path.clone(),
            query: descriptor.query.clone(),
            headers,
            body: descriptor.body.clone(),
            timeout,
        };
        self.inner.logger.log_request(metadata, &request, attempt);

        let started = Instant::now();
        let response = match tokio::time::timeout(timeout, transport.send(request)).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => return Err(e.into()),
            Err(_) => return Err(TransportError::Timeout(timeout).into()),
        };

        let body = response.body_json();
        self.inner
            .logger
            .log_response(metadata, response.status, body.as_ref(), started.elapsed());

        if response.is_success() {
            Ok((response.status, body.unwrap_or(Value::Null)))
        } else {
            Err(ApiError::from_http_response(response.status, body.as_ref()))
        }
    }

    /// Refresh once and re-issue, or clear the session.
    async fn recover_expired_token(
        &self,
        descriptor: &RequestDescriptor,
        metadata: &RequestMetadata,
        error: ApiError,
    ) -> Result<(u16, Value), ApiError> {
        let refresher = self.inner.refresher.read().as_ref().and_then(Weak::upgrade);

        if let Some(refresher) = refresher {
            let Some(slot) = RefreshSlot::acquire(&self.inner.refreshing) else {
                // Another request owns the refresh.
                return Err(error);
            };
            let refreshed = self.refresh_tokens(refresher.as_ref()).await;
            drop(slot);

            match refreshed {
                Ok(()) => {
                    debug!(request_id = %metadata.request_id, "token refreshed, re-issuing request");
                    let retried = self.execute(descriptor, metadata).await;
                    if matches!(&retried, Err(e) if e.code() == ErrorKind::TokenExpired) {
                        self.clear_tokens().await;
                    }
                    return retried;
                }
                Err(e) => {
                    debug!(request_id = %metadata.request_id, code = %e.code(), "token refresh failed");
                }
            }
        }

        self.clear_tokens().await;
        Err(error)
    }

    async fn refresh_tokens(&self, refresher: &dyn TokenRefresher) -> Result<(), ApiError> {
        let refresh_token = match self.inner.tokens.get_refresh_token().await {
            Ok(Some(token)) => token,
            Ok(None) => {
                return Err(ApiError::new(ErrorKind::TokenInvalid, "No refresh token stored"));
            }
            Err(e) => return Err(ApiError::new(ErrorKind::UnknownError, e.to_string())),
        };

        let tokens = refresher.refresh(&refresh_token).await?;
        self.inner
            .tokens
            .store_tokens(&tokens)
            .await
            .map_err(|e| ApiError::new(ErrorKind::UnknownError, e.to_string()))
    }

    async fn clear_tokens(&self) {
        if let Err(e) = self.inner.tokens.clear_tokens().await {
            warn!(error = %e, "failed to clear tokens");
        }
    }

    fn transport(&self, service: ServiceName) -> Result<Arc<dyn Transport>, ApiError> {
        if let Some(transport) = self.inner.transports.read().get(&service) {
            return Ok(transport.clone());
        }

        let mut transports = self.inner.transports.write();
        if let Some(transport) = transports.get(&service) {
            return Ok(transport.clone());
        }

        let settings = self.inner.config.service_settings(service).ok_or_else(|| {
            TransportError::InvalidRequest(format!("No base URL configured for service '{service}'"))
        })?;
        let transport = self.inner.factory.create(&settings)?;
        debug!(service = %service, base_url = %settings.base_url, "created transport");
        transports.insert(service, transport.clone());
        Ok(transport)
    }

    fn breaker(&self, service: ServiceName) -> Option<Arc<CircuitBreaker>> {
        let config = self.inner.config.circuit_breaker.as_ref()?;
        let breaker = self
            .inner
            .breakers
            .entry(service)
            .or_insert_with(|| Arc::new(CircuitBreaker::new(service, config.clone())))
            .clone();
        Some(breaker)
    }
}

/// Completes a dispatched request's metrics when its future is dropped
/// before settling.
struct UnfinishedRequest<'a> {
    analytics: &'a RequestAnalytics,
    request_id: &'a str,
    armed: bool,
}

impl Drop for UnfinishedRequest<'_> {
    fn drop(&mut self) {
        if self.armed {
            debug!(request_id = %self.request_id, "request dropped before completion");
            self.analytics
                .track_request_end(self.request_id, None, false, Some(ErrorKind::UnknownError));
        }
    }
}

/// Exclusive right to run a token refresh, released on drop.
struct RefreshSlot<'a>(&'a AtomicBool);

impl<'a> RefreshSlot<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for RefreshSlot<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Builder for [`HttpClient`].
pub struct HttpClientBuilder {
    config: HttpClientConfig,
    factory: Option<Arc<dyn TransportFactory>>,
    tokens: Option<Arc<dyn TokenStore>>,
    analytics: Option<Arc<RequestAnalytics>>,
    optimizer: Option<RequestOptimizer<Value>>,
}

impl HttpClientBuilder {
    pub fn new(config: HttpClientConfig) -> Self {
        Self {
            config,
            factory: None,
            tokens: None,
            analytics: None,
            optimizer: None,
        }
    }

    /// Transport factory; defaults to reqwest, or an empty mock when
    /// `enable_mock` is set.
    pub fn transport_factory(mut self, factory: impl TransportFactory + 'static) -> Self {
        self.factory = Some(Arc::new(factory));
        self
    }

    pub fn token_store(mut self, store: Arc<dyn TokenStore>) -> Self {
        self.tokens = Some(store);
        self
    }

    pub fn analytics(mut self, analytics: Arc<RequestAnalytics>) -> Self {
        self.analytics = Some(analytics);
        self
    }

    /// Enables `.dedupe()` on requests.
    pub fn optimizer(mut self, optimizer: RequestOptimizer<Value>) -> Self {
        self.optimizer = Some(optimizer);
        self
    }

    pub fn build(self) -> HttpClient {
        let factory = self.factory.unwrap_or_else(|| {
            if self.config.enable_mock {
                Arc::new(MockTransport::new())
            } else {
                Arc::new(ReqwestTransportFactory)
            }
        });
        let logger = RequestLogger::new(self.config.enable_logging);

        HttpClient {
            inner: Arc::new(ClientInner {
                config: self.config,
                factory,
                transports: RwLock::new(HashMap::new()),
                tokens: self.tokens.unwrap_or_else(|| Arc::new(InMemoryTokenStore::new())),
                analytics: self.analytics.unwrap_or_default(),
                optimizer: self.optimizer,
                refresher: RwLock::new(None),
                refreshing: AtomicBool::new(false),
                breakers: DashMap::new(),
                logger,
            }),
        }
    }
}

//! In-process transport answering from a route table.

use super::{Transport, TransportFactory, TransportRequest, TransportResponse};
use crate::config::ServiceSettings;
use crate::error::TransportError;
use async_trait::async_trait;
use courier_core::ServiceName;
use http::Method;
use parking_lot::{Mutex, RwLock};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

type Handler = Arc<dyn Fn(&TransportRequest) -> Result<TransportResponse, TransportError> + Send + Sync>;

type RouteKey = (ServiceName, Method, String);

/// A request as the mock backend saw it, fixed headers included.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub service: ServiceName,
    pub request: TransportRequest,
}

#[derive(Default)]
struct MockState {
    routes: RwLock<HashMap<RouteKey, Handler>>,
    recorded: Mutex<Vec<RecordedRequest>>,
    latency: RwLock<Option<Duration>>,
}

fn normalize(path: &str) -> String {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    path.trim_matches('/').to_string()
}

/// Route table shared by every per-service mock transport.
///
/// Clones share routes and the request log, so a test can keep one handle
/// and hand another to the client as its [`TransportFactory`]. Unmatched
/// routes answer 404 with a `NOT_FOUND` body.
#[derive(Clone, Default)]
pub struct MockTransport {
    state: Arc<MockState>,
}

impl std::fmt::Debug for MockTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockTransport")
            .field("routes", &self.state.routes.read().len())
            .field("recorded", &self.state.recorded.lock().len())
            .finish()
    }
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `method path` on `service` with `handler`.
    pub fn route<F>(&self, service: ServiceName, method: Method, path: &str, handler: F) -> &Self
    where
        F: Fn(&TransportRequest) -> Result<TransportResponse, TransportError> + Send + Sync + 'static,
    {
        self.state
            .routes
            .write()
            .insert((service, method, normalize(path)), Arc::new(handler));
        self
    }

    /// Answer with a fixed status and JSON body.
    pub fn respond(
        &self,
        service: ServiceName,
        method: Method,
        path: &str,
        status: u16,
        body: Value,
    ) -> &Self {
        let response = TransportResponse::json(status, &body);
        self.route(service, method, path, move |_| Ok(response.clone()))
    }

    /// Fail every call with a transport error.
    pub fn fail(&self, service: ServiceName, method: Method, path: &str, error: TransportError) -> &Self {
        self.route(service, method, path, move |_| Err(error.clone()))
    }

    /// Fail the first `times` calls, then answer with `status` and `body`.
    #[allow(clippy::too_many_arguments)]
    pub fn fail_times(
        &self,
        service: ServiceName,
        method: Method,
        path: &str,
        times: u32,
        error: TransportError,
        status: u16,
        body: Value,
    ) -> &Self {
        let calls = AtomicU32::new(0);
        let response = TransportResponse::json(status, &body);
        self.route(service, method, path, move |_| {
            if calls.fetch_add(1, Ordering::SeqCst) < times {
                Err(error.clone())
            } else {
                Ok(response.clone())
            }
        })
    }

    /// Delay every response by `latency`.
    pub fn with_latency(self, latency: Duration) -> Self {
        self.set_latency(Some(latency));
        self
    }

    pub fn set_latency(&self, latency: Option<Duration>) {
        *self.state.latency.write() = latency;
    }

    /// Every request received so far, in order.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.recorded.lock().clone()
    }

    /// Requests received for `service` and `path`.
    pub fn requests_to(&self, service: ServiceName, path: &str) -> Vec<RecordedRequest> {
        let path = normalize(path);
        self.state
            .recorded
            .lock()
            .iter()
            .filter(|r| r.service == service && normalize(&r.request.path) == path)
            .cloned()
            .collect()
    }

    pub fn clear_requests(&self) {
        self.state.recorded.lock().clear();
    }

    /// Transport bound to one service.
    pub fn for_service(&self, settings: &ServiceSettings) -> MockServiceTransport {
        MockServiceTransport {
            service: settings.service,
            default_headers: settings.default_headers.clone(),
            state: self.state.clone(),
        }
    }
}

impl TransportFactory for MockTransport {
    fn create(&self, settings: &ServiceSettings) -> Result<Arc<dyn Transport>, TransportError> {
        Ok(Arc::new(self.for_service(settings)))
    }
}

/// Mock transport for a single service.
pub struct MockServiceTransport {
    service: ServiceName,
    default_headers: Vec<(String, String)>,
    state: Arc<MockState>,
}

#[async_trait]
impl Transport for MockServiceTransport {
    async fn send(&self, mut request: TransportRequest) -> Result<TransportResponse, TransportError> {
        let mut headers = self.default_headers.clone();
        headers.append(&mut request.headers);
        request.headers = headers;

        self.state.recorded.lock().push(RecordedRequest {
            service: self.service,
            request: request.clone(),
        });

        let latency = *self.state.latency.read();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        let handler = self
            .state
            .routes
            .read()
            .get(&(self.service, request.method.clone(), normalize(&request.path)))
            .cloned();

        match handler {
            Some(handler) => handler(&request),
            None => Ok(TransportResponse::json(
                404,
                &json!({
                    "code": "NOT_FOUND",
                    "message": format!("No mock route for {} {}/{}", request.method, self.service, normalize(&request.path)),
                }),
            )),
        }
    }
}

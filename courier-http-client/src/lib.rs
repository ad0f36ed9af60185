//! # Courier HTTP Client
//!
//! Service-aware HTTP client for the Courier request layer. Every request
//! names a backend [`ServiceName`]; the client resolves its base address,
//! attaches fixed headers and the bearer token, retries retryable failures
//! with exponential backoff and reports every outcome to
//! [`RequestAnalytics`](courier_analytics::RequestAnalytics).
//!
//! Errors are always [`ApiError`] values from the closed
//! [`ErrorKind`](courier_core::ErrorKind) taxonomy.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use courier_config::ApiConfig;
//! use courier_core::ServiceName;
//! use courier_http_client::HttpClient;
//! use serde_json::Value;
//!
//! # async fn run() -> Result<(), courier_core::ApiError> {
//! let client = HttpClient::from_api_config(&ApiConfig::default());
//!
//! let profile: Value = client
//!     .get(ServiceName::User, "profile")
//!     .retries(1)
//!     .send()
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Mock transport
//!
//! ```rust
//! use courier_core::ServiceName;
//! use courier_http_client::{HttpClient, HttpClientConfig, MockTransport};
//! use http::Method;
//! use serde_json::{Value, json};
//!
//! # tokio_test::block_on(async {
//! let mock = MockTransport::new();
//! mock.respond(ServiceName::Feed, Method::GET, "posts", 200, json!([{"id": 1}]));
//!
//! let client = HttpClient::builder(HttpClientConfig::default())
//!     .transport_factory(mock.clone())
//!     .build();
//!
//! let posts: Value = client.get(ServiceName::Feed, "posts").send().await.unwrap();
//! assert_eq!(posts[0]["id"], 1);
//! # });
//! ```

mod auth;
mod circuit_breaker;
mod client;
mod config;
mod error;
mod logging;
mod request;
mod retry;
mod token;
pub mod transport;

pub use auth::{PUBLIC_ENDPOINTS, is_public_endpoint};
pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
pub use client::{HttpClient, HttpClientBuilder};
pub use config::{HttpClientConfig, HttpClientConfigBuilder, ServiceSettings};
pub use error::TransportError;
pub use logging::{RequestLogger, redact_body, redact_headers};
pub use request::{RequestBuilder, RequestDescriptor};
pub use retry::{BackoffStrategy, RetryConfig};
pub use token::{AuthTokens, InMemoryTokenStore, TokenRefresher, TokenStore, TokenStoreError};
pub use transport::{
    MockTransport, ReqwestTransport, ReqwestTransportFactory, Transport, TransportFactory,
    TransportRequest, TransportResponse,
};

pub use courier_core::{ApiError, ErrorKind, ServiceName};

//! # Courier Services
//!
//! Domain callers built on the Courier HTTP client. Each operation
//! validates its input, calls the backend and manages the session tokens.
//!
//! [`mock_backend`] simulates the auth and user backends in-process, so
//! the whole request layer can run without a network:
//!
//! ```
//! use courier_config::ApiConfig;
//! use courier_services::{Services, build_client, models::LoginRequest};
//!
//! # tokio_test::block_on(async {
//! let services = Services::new(build_client(&ApiConfig::default()));
//!
//! let response = services
//!     .auth
//!     .login(&LoginRequest::new("test@example.com", "password"))
//!     .await
//!     .unwrap();
//! assert!(response.is_success());
//!
//! let profile = services.user.profile().await.unwrap();
//! assert_eq!(profile.email, "test@example.com");
//! # });
//! ```

mod auth;
pub mod mock;
pub mod models;
mod user;

pub use auth::AuthService;
pub use mock::mock_backend;
pub use user::UserService;

use courier_config::ApiConfig;
use courier_core::{ApiError, ErrorKind};
use courier_http_client::{HttpClient, HttpClientConfig};
use courier_validation::{InputValidator, ValidationSchema};
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Client for `config`, wired to [`mock_backend`] when mock mode is on.
pub fn build_client(config: &ApiConfig) -> HttpClient {
    let builder = HttpClient::builder(HttpClientConfig::from(config));
    if config.enable_mock {
        builder.transport_factory(mock_backend()).build()
    } else {
        builder.build()
    }
}

/// The domain services sharing one client.
#[derive(Debug, Clone)]
pub struct Services {
    pub client: HttpClient,
    pub auth: Arc<AuthService>,
    pub user: UserService,
}

impl Services {
    pub fn new(client: HttpClient) -> Self {
        Self {
            auth: AuthService::new(client.clone()),
            user: UserService::new(client.clone()),
            client,
        }
    }
}

/// Validate `payload` strictly and return the sanitized body without nulls.
pub(crate) fn validated<T: Serialize + ?Sized>(
    payload: &T,
    schema: &ValidationSchema,
) -> Result<Map<String, Value>, ApiError> {
    let value = serde_json::to_value(payload)
        .map_err(|e| ApiError::new(ErrorKind::InvalidInput, e.to_string()))?;
    let Value::Object(data) = value else {
        return Err(ApiError::new(ErrorKind::InvalidInput, "Payload must be a JSON object"));
    };

    let mut sanitized = InputValidator::validate_api_request(&data, schema)?;
    sanitized.retain(|_, v| !v.is_null());
    Ok(sanitized)
}

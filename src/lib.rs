// Courier - a service-aware HTTP request layer for mobile backends
//
// Re-exports the request layer crates behind one dependency. The HTTP
// client and its collaborators are always available; logging setup,
// validation and the domain services are opt-in features.

// Shared vocabulary: errors, service names, envelopes
pub use courier_core::*;

pub use courier_analytics;
pub use courier_config;
pub use courier_http_client;
pub use courier_optimizer;

pub use courier_analytics::{AnalyticsConfig, RequestAnalytics};
pub use courier_config::{ApiConfig, Environment};
pub use courier_http_client::{
    AuthTokens, HttpClient, HttpClientConfig, InMemoryTokenStore, MockTransport,
    RequestDescriptor, RetryConfig, TokenRefresher, TokenStore,
};
pub use courier_optimizer::{BatchOptions, RequestOptimizer};

#[cfg(feature = "log")]
pub use courier_log;

#[cfg(feature = "validation")]
pub use courier_validation;

#[cfg(feature = "services")]
pub use courier_services;

// Prelude for common imports
pub mod prelude {
    pub use crate::{
        ApiConfig, ApiError, ApiResponse, AuthTokens, Environment, ErrorKind, HttpClient,
        HttpClientConfig, RequestAnalytics, RequestOptimizer, ServiceName, TokenStore,
    };

    #[cfg(feature = "validation")]
    pub use courier_validation::{CommonSchemas, InputValidator, ValidationSchema};

    #[cfg(feature = "services")]
    pub use courier_services::{AuthService, Services, UserService, build_client};
}

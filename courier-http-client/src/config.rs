//! HTTP client configuration.

use crate::circuit_breaker::CircuitBreakerConfig;
use crate::retry::RetryConfig;
use courier_config::{ApiConfig, Environment};
use courier_core::ServiceName;
use std::collections::BTreeMap;
use std::time::Duration;

/// HTTP client configuration.
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Default per-attempt timeout.
    pub timeout: Duration,
    /// Connection timeout for real transports.
    pub connect_timeout: Duration,
    /// Retry configuration.
    pub retry: RetryConfig,
    /// Circuit breaker configuration, one breaker per service when set.
    pub circuit_breaker: Option<CircuitBreakerConfig>,
    /// Log requests and responses at debug level.
    pub enable_logging: bool,
    /// Route every request to the in-process mock transport.
    pub enable_mock: bool,
    pub environment: Environment,
    pub app_version: String,
    pub platform: String,
    /// Base address per service.
    pub services: BTreeMap<ServiceName, String>,
    /// User agent string.
    pub user_agent: String,
    /// How long a settled deduplicated request stays reserved.
    pub dedupe_ttl: Duration,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self::from(&ApiConfig::default())
    }
}

impl From<&ApiConfig> for HttpClientConfig {
    fn from(api: &ApiConfig) -> Self {
        Self {
            timeout: api.timeout(),
            connect_timeout: Duration::from_secs(10),
            retry: RetryConfig::exponential(api.retries, api.retry_delay()),
            circuit_breaker: None,
            enable_logging: api.enable_logging,
            enable_mock: api.enable_mock,
            environment: api.environment,
            app_version: api.app_version.clone(),
            platform: api.platform.clone(),
            services: api.services.clone(),
            user_agent: format!("courier/{}", env!("CARGO_PKG_VERSION")),
            dedupe_ttl: Duration::from_secs(1),
        }
    }
}

impl From<ApiConfig> for HttpClientConfig {
    fn from(api: ApiConfig) -> Self {
        Self::from(&api)
    }
}

impl HttpClientConfig {
    pub fn builder() -> HttpClientConfigBuilder {
        HttpClientConfigBuilder::default()
    }

    /// Headers sent with every request.
    pub fn default_headers(&self) -> Vec<(String, String)> {
        vec![
            ("Content-Type".to_string(), "application/json".to_string()),
            ("Accept".to_string(), "application/json".to_string()),
            ("X-App-Version".to_string(), self.app_version.clone()),
            ("X-Platform".to_string(), self.platform.clone()),
            ("X-Environment".to_string(), self.environment.to_string()),
        ]
    }

    /// Transport settings for one service, if it has a base address.
    pub fn service_settings(&self, service: ServiceName) -> Option<ServiceSettings> {
        let base_url = self.services.get(&service)?;
        Some(ServiceSettings {
            service,
            base_url: base_url.clone(),
            timeout: self.timeout,
            connect_timeout: self.connect_timeout,
            user_agent: self.user_agent.clone(),
            default_headers: self.default_headers(),
        })
    }
}

/// Everything a transport needs to talk to one service.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceSettings {
    pub service: ServiceName,
    pub base_url: String,
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub user_agent: String,
    pub default_headers: Vec<(String, String)>,
}

/// Builder for [`HttpClientConfig`].
#[derive(Debug, Default)]
pub struct HttpClientConfigBuilder {
    config: HttpClientConfig,
}

impl HttpClientConfigBuilder {
    /// Start from an existing application config.
    pub fn from_api_config(api: &ApiConfig) -> Self {
        Self {
            config: HttpClientConfig::from(api),
        }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    pub fn retry(mut self, retry: RetryConfig) -> Self {
        self.config.retry = retry;
        self
    }

    pub fn circuit_breaker(mut self, config: CircuitBreakerConfig) -> Self {
        self.config.circuit_breaker = Some(config);
        self
    }

    pub fn enable_logging(mut self, enabled: bool) -> Self {
        self.config.enable_logging = enabled;
        self
    }

    pub fn enable_mock(mut self, enabled: bool) -> Self {
        self.config.enable_mock = enabled;
        self
    }

    pub fn environment(mut self, environment: Environment) -> Self {
        self.config.environment = environment;
        self
    }

    pub fn app_version(mut self, version: impl Into<String>) -> Self {
        self.config.app_version = version.into();
        self
    }

    pub fn platform(mut self, platform: impl Into<String>) -> Self {
        self.config.platform = platform.into();
        self
    }

    pub fn base_url(mut self, service: ServiceName, url: impl Into<String>) -> Self {
        self.config.services.insert(service, url.into());
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    pub fn dedupe_ttl(mut self, ttl: Duration) -> Self {
        self.config.dedupe_ttl = ttl;
        self
    }

    pub fn build(self) -> HttpClientConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_api_config() {
        let api = ApiConfig::for_environment(Environment::Production);
        let config = HttpClientConfig::from(&api);

        assert_eq!(config.timeout, Duration::from_secs(15));
        assert_eq!(config.retry.max_retries, 3);
        assert_eq!(config.retry.delay_for_attempt(0), Duration::from_secs(1));
        assert!(!config.enable_mock);
    }

    #[test]
    fn test_default_headers() {
        let config = HttpClientConfig::builder()
            .app_version("2.1.0")
            .platform("ios")
            .environment(Environment::Staging)
            .build();
        let headers = config.default_headers();

        assert!(headers.contains(&("X-App-Version".into(), "2.1.0".into())));
        assert!(headers.contains(&("X-Platform".into(), "ios".into())));
        assert!(headers.contains(&("X-Environment".into(), "staging".into())));
        assert!(headers.contains(&("Accept".into(), "application/json".into())));
    }

    #[test]
    fn test_service_settings() {
        let config = HttpClientConfig::builder()
            .base_url(ServiceName::Chat, "http://chat.local")
            .build();

        let settings = config.service_settings(ServiceName::Chat).unwrap();
        assert_eq!(settings.base_url, "http://chat.local");
        assert_eq!(settings.service, ServiceName::Chat);
    }
}

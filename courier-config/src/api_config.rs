// Request-layer configuration

use crate::{ConfigError, ConfigLoader, ConfigValidator, EnvLoader, FileFormat, Result, Validate};
use courier_core::ServiceName;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Deployment environment the app is built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Staging => "staging",
            Self::Production => "production",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "staging" | "stage" => Ok(Self::Staging),
            "production" | "prod" => Ok(Self::Production),
            other => Err(ConfigError::InvalidValue {
                key: "environment".to_string(),
                value: other.to_string(),
            }),
        }
    }
}

/// Settings consumed by the HTTP client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    pub environment: Environment,
    /// Sent as `X-App-Version`.
    pub app_version: String,
    /// Sent as `X-Platform`.
    pub platform: String,
    /// Default per-request timeout in milliseconds.
    pub timeout_ms: u64,
    /// Default retry budget for retryable failures.
    pub retries: u32,
    /// Base backoff delay in milliseconds.
    pub retry_delay_ms: u64,
    /// Log request and response bodies (redacted) at debug level.
    pub enable_logging: bool,
    /// Use the in-process mock transport instead of the network.
    pub enable_mock: bool,
    /// Base address per backend service.
    pub services: BTreeMap<ServiceName, String>,
}

impl ApiConfig {
    /// Defaults for the given environment.
    pub fn for_environment(environment: Environment) -> Self {
        let (host, timeout_ms, enable_logging, enable_mock) = match environment {
            Environment::Development => ("http://localhost:3000/api", 30_000, true, true),
            Environment::Staging => ("https://staging-api.example.com", 20_000, true, false),
            Environment::Production => ("https://api.example.com", 15_000, false, false),
        };

        let services = ServiceName::ALL
            .iter()
            .map(|service| (*service, format!("{}/{}", host, service)))
            .collect();

        Self {
            environment,
            app_version: "1.0.0".to_string(),
            platform: "mobile".to_string(),
            timeout_ms,
            retries: 3,
            retry_delay_ms: 1_000,
            enable_logging,
            enable_mock,
            services,
        }
    }

    pub fn builder() -> ApiConfigBuilder {
        ApiConfigBuilder::default()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn base_url(&self, service: ServiceName) -> Option<&str> {
        self.services.get(&service).map(String::as_str)
    }

    /// Load from `COURIER_*` process environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(&EnvLoader::courier().load())
    }

    /// Load a `.env` file into the process environment, then read it.
    ///
    /// A missing default `.env` is not an error; a missing explicit path is.
    pub fn from_dotenv(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                dotenvy::from_path(path).map_err(|e| ConfigError::LoadError(e.to_string()))?;
            }
            None => {
                dotenvy::dotenv().ok();
            }
        }
        Self::from_env()
    }

    /// Build from prefix-stripped, lowercased variables (see [`EnvLoader::filter`]).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self> {
        let environment = vars
            .get("environment")
            .map(|v| v.parse::<Environment>())
            .transpose()?
            .unwrap_or_default();

        let mut config = Self::for_environment(environment);
        config.apply_overrides(vars)?;
        Ok(config)
    }

    /// Load from a JSON, TOML or `.env` file, chosen by extension.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let loader = ConfigLoader::auto(path.as_ref())?;
        let value = loader.load_file(path.as_ref())?;

        match loader.format() {
            FileFormat::Env => {
                let pairs = value
                    .as_object()
                    .into_iter()
                    .flatten()
                    .filter_map(|(k, v)| v.as_str().map(|v| (k.clone(), v.to_string())));
                Self::from_vars(&EnvLoader::courier().filter(pairs))
            }
            FileFormat::Json | FileFormat::Toml => Self::from_value(value),
        }
    }

    /// Build from a structured document layered over environment defaults.
    pub fn from_value(value: Value) -> Result<Self> {
        let environment = value
            .get("environment")
            .and_then(Value::as_str)
            .map(str::parse::<Environment>)
            .transpose()?
            .unwrap_or_default();

        let mut merged = serde_json::to_value(Self::for_environment(environment))
            .map_err(|e| ConfigError::DeserializationError(e.to_string()))?;
        merge(&mut merged, value);

        serde_json::from_value(merged).map_err(|e| ConfigError::DeserializationError(e.to_string()))
    }

    /// Apply overrides such as `api_retries` or `auth_url`.
    pub fn apply_overrides(&mut self, vars: &HashMap<String, String>) -> Result<()> {
        for (key, value) in vars {
            match key.as_str() {
                "environment" => self.environment = value.parse()?,
                "app_version" => self.app_version = value.clone(),
                "platform" => self.platform = value.clone(),
                "api_timeout_ms" => self.timeout_ms = parse_number(key, value)?,
                "api_retries" => self.retries = parse_number(key, value)?,
                "api_retry_delay_ms" => self.retry_delay_ms = parse_number(key, value)?,
                "enable_logging" => self.enable_logging = parse_bool(key, value)?,
                "enable_mock" => self.enable_mock = parse_bool(key, value)?,
                other => {
                    if let Some(service) = other.strip_suffix("_url")
                        && let Ok(service) = service.parse::<ServiceName>()
                    {
                        self.services.insert(service, value.clone());
                    }
                }
            }
        }
        Ok(())
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self::for_environment(Environment::default())
    }
}

impl Validate for ApiConfig {
    fn validate(&self) -> Result<()> {
        ConfigValidator::not_empty(&self.app_version, "app_version")?;
        ConfigValidator::not_empty(&self.platform, "platform")?;
        ConfigValidator::in_range(self.timeout_ms, 1, 300_000, "timeout_ms")?;
        ConfigValidator::in_range(self.retries, 0, 10, "retries")?;
        ConfigValidator::in_range(self.retry_delay_ms, 0, 60_000, "retry_delay_ms")?;

        for (service, url) in &self.services {
            ConfigValidator::is_url(url, &format!("services.{}", service))?;
        }
        Ok(())
    }
}

/// Builder for [`ApiConfig`].
#[derive(Debug, Default)]
pub struct ApiConfigBuilder {
    config: ApiConfig,
}

impl ApiConfigBuilder {
    /// Start from an existing configuration.
    pub fn from_config(config: ApiConfig) -> Self {
        Self { config }
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

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn retries(mut self, retries: u32) -> Self {
        self.config.retries = retries;
        self
    }

    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.config.retry_delay_ms = delay.as_millis() as u64;
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

    pub fn service_url(mut self, service: ServiceName, url: impl Into<String>) -> Self {
        self.config.services.insert(service, url.into());
        self
    }

    pub fn build(self) -> ApiConfig {
        self.config
    }
}

fn parse_number<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

/// Recursively overlay `overlay` onto `base`; objects merge, everything else replaces.
fn merge(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                merge(base.entry(key).or_insert(Value::Null), value);
            }
        }
        (slot, value) => *slot = value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_environment_defaults() {
        let dev = ApiConfig::for_environment(Environment::Development);
        assert!(dev.enable_mock);
        assert!(dev.enable_logging);
        assert_eq!(dev.base_url(ServiceName::Auth), Some("http://localhost:3000/api/auth"));

        let prod = ApiConfig::for_environment(Environment::Production);
        assert!(!prod.enable_mock);
        assert!(!prod.enable_logging);
        assert_eq!(prod.timeout(), Duration::from_secs(15));
        assert!(prod.validate().is_ok());
    }

    #[test]
    fn test_from_vars() {
        let config = ApiConfig::from_vars(&vars(&[
            ("environment", "production"),
            ("api_retries", "5"),
            ("api_retry_delay_ms", "250"),
            ("enable_mock", "yes"),
            ("user_url", "https://users.internal"),
            ("unrelated", "ignored"),
        ]))
        .unwrap();

        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.retries, 5);
        assert_eq!(config.retry_delay(), Duration::from_millis(250));
        assert!(config.enable_mock);
        assert_eq!(config.base_url(ServiceName::User), Some("https://users.internal"));
    }

    #[test]
    fn test_invalid_override() {
        let err = ApiConfig::from_vars(&vars(&[("api_retries", "many")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));

        let err = ApiConfig::from_vars(&vars(&[("environment", "qa")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_from_value_layers_over_defaults() {
        let value = serde_json::json!({
            "environment": "staging",
            "retries": 1,
            "services": {"chat": "https://chat.example.com"}
        });

        let config = ApiConfig::from_value(value).unwrap();
        assert_eq!(config.environment, Environment::Staging);
        assert_eq!(config.retries, 1);
        assert_eq!(config.timeout_ms, 20_000);
        assert_eq!(config.base_url(ServiceName::Chat), Some("https://chat.example.com"));
        assert_eq!(
            config.base_url(ServiceName::Auth),
            Some("https://staging-api.example.com/auth")
        );
    }

    #[test]
    fn test_validation_rejects_bad_url() {
        let config = ApiConfig::builder()
            .service_url(ServiceName::Feed, "feed-service")
            .build();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_builder() {
        let config = ApiConfig::builder()
            .environment(Environment::Production)
            .app_version("2.3.1")
            .platform("ios")
            .timeout(Duration::from_secs(5))
            .retries(2)
            .retry_delay(Duration::from_millis(100))
            .enable_logging(false)
            .enable_mock(false)
            .build();

        assert_eq!(config.app_version, "2.3.1");
        assert_eq!(config.timeout_ms, 5_000);
        assert_eq!(config.retry_delay_ms, 100);
        assert!(config.validate().is_ok());
    }
}

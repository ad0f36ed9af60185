//! Analytics configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for request analytics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    /// When false every tracking call is a no-op
    pub enabled: bool,
    /// Maximum number of request metrics retained (oldest evicted first)
    pub max_metrics: usize,
    /// Error rate (percent) at or above which a service is unhealthy
    pub max_error_rate: f64,
    /// Response time that triggers a warning alert, in milliseconds
    pub warning_response_ms: u64,
    /// Response time that triggers a critical alert, in milliseconds
    pub critical_response_ms: u64,
    /// Retry count above which an alert is logged
    pub max_retries: u32,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_metrics: 1000,
            max_error_rate: 10.0,
            warning_response_ms: 2_000,
            critical_response_ms: 5_000,
            max_retries: 3,
        }
    }
}

impl AnalyticsConfig {
    /// Create a new configuration builder
    pub fn builder() -> AnalyticsConfigBuilder {
        AnalyticsConfigBuilder::default()
    }

    /// Configuration that records nothing
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }
}

/// Builder for AnalyticsConfig
#[derive(Default)]
pub struct AnalyticsConfigBuilder {
    config: AnalyticsConfig,
}

impl AnalyticsConfigBuilder {
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.config.enabled = enabled;
        self
    }

    pub fn max_metrics(mut self, max: usize) -> Self {
        self.config.max_metrics = max.max(1);
        self
    }

    pub fn max_error_rate(mut self, rate: f64) -> Self {
        self.config.max_error_rate = rate.clamp(0.0, 100.0);
        self
    }

    pub fn warning_threshold(mut self, threshold: Duration) -> Self {
        self.config.warning_response_ms = threshold.as_millis() as u64;
        self
    }

    pub fn critical_threshold(mut self, threshold: Duration) -> Self {
        self.config.critical_response_ms = threshold.as_millis() as u64;
        self
    }

    pub fn max_retries(mut self, max: u32) -> Self {
        self.config.max_retries = max;
        self
    }

    pub fn build(self) -> AnalyticsConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AnalyticsConfig::default();
        assert!(config.enabled);
        assert_eq!(config.max_metrics, 1000);
        assert_eq!(config.max_error_rate, 10.0);
    }

    #[test]
    fn test_builder() {
        let config = AnalyticsConfig::builder()
            .max_metrics(0)
            .max_error_rate(150.0)
            .warning_threshold(Duration::from_millis(500))
            .critical_threshold(Duration::from_secs(1))
            .max_retries(1)
            .build();

        assert_eq!(config.max_metrics, 1);
        assert_eq!(config.max_error_rate, 100.0);
        assert_eq!(config.warning_response_ms, 500);
        assert_eq!(config.critical_response_ms, 1000);
        assert_eq!(config.max_retries, 1);
    }

    #[test]
    fn test_disabled() {
        assert!(!AnalyticsConfig::disabled().enabled);
    }
}

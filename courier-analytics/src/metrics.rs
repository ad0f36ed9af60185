//! Metrics types

use chrono::{DateTime, Utc};
use courier_core::{ErrorKind, RequestMetadata, ServiceName};
use serde::{Deserialize, Serialize};

/// Lifecycle record of a single logical request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestMetrics {
    pub request_id: String,
    pub service: ServiceName,
    pub endpoint: String,
    pub method: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub duration_ms: Option<u64>,
    pub status_code: Option<u16>,
    pub success: bool,
    pub error_type: Option<ErrorKind>,
    pub retry_count: u32,
    pub timestamp: DateTime<Utc>,
}

impl RequestMetrics {
    pub fn started(metadata: &RequestMetadata) -> Self {
        Self {
            request_id: metadata.request_id.clone(),
            service: metadata.service,
            endpoint: metadata.endpoint.clone(),
            method: metadata.method.clone(),
            start_time: metadata.start_time,
            end_time: None,
            duration_ms: None,
            status_code: None,
            success: false,
            error_type: None,
            retry_count: 0,
            timestamp: Utc::now(),
        }
    }

    /// Whether `track_request_end` has been applied.
    pub fn is_complete(&self) -> bool {
        self.end_time.is_some()
    }
}

/// Rolling health of one backend service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceHealth {
    pub service: ServiceName,
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub average_response_time: f64,
    /// Percentage of failed requests, 0..=100
    pub error_rate: f64,
    pub last_request_time: Option<DateTime<Utc>>,
    pub is_healthy: bool,
}

impl ServiceHealth {
    pub fn new(service: ServiceName) -> Self {
        Self {
            service,
            total_requests: 0,
            successful_requests: 0,
            failed_requests: 0,
            average_response_time: 0.0,
            error_rate: 0.0,
            last_request_time: None,
            is_healthy: true,
        }
    }

    /// Fold one completed request into the running aggregates.
    pub fn record(&mut self, duration_ms: u64, success: bool, max_error_rate: f64) {
        self.total_requests += 1;
        if success {
            self.successful_requests += 1;
        } else {
            self.failed_requests += 1;
        }

        let n = self.total_requests as f64;
        self.average_response_time =
            (self.average_response_time * (n - 1.0) + duration_ms as f64) / n;
        self.error_rate = self.failed_requests as f64 / n * 100.0;
        self.is_healthy = self.error_rate < max_error_rate;
        self.last_request_time = Some(Utc::now());
    }
}

/// Aggregate over one `service` + `endpoint` pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointStat {
    pub service: ServiceName,
    pub endpoint: String,
    pub requests: u64,
    pub average_response_time: f64,
    pub error_rate: f64,
}

/// Derived view over the retained metrics.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSummary {
    pub total_requests: u64,
    pub average_response_time: f64,
    pub error_rate: f64,
    pub slowest_endpoints: Vec<EndpointStat>,
    pub error_prone_endpoints: Vec<EndpointStat>,
}

/// Everything the analytics component knows, for dashboards and diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSnapshot {
    pub metrics: Vec<RequestMetrics>,
    pub service_health: Vec<ServiceHealth>,
    pub summary: AnalyticsSummary,
    pub generated_at: DateTime<Utc>,
}

impl AnalyticsSnapshot {
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

//! Request lifecycle tracking and aggregation

use crate::{AnalyticsConfig, AnalyticsSnapshot, AnalyticsSummary, EndpointStat, RequestMetrics, ServiceHealth};
use chrono::Utc;
use courier_core::{ErrorKind, RequestMetadata, ServiceName};
use dashmap::DashMap;
use parking_lot::RwLock;
use std::collections::{HashMap, VecDeque};
use tokio::time::Instant;
use tracing::{debug, warn};

const TOP_ENDPOINTS: usize = 5;

/// Thread-safe request analytics.
///
/// Tracking never fails and never affects the request it observes.
pub struct RequestAnalytics {
    config: AnalyticsConfig,
    inner: RwLock<Inner>,
    health: DashMap<ServiceName, ServiceHealth>,
}

#[derive(Default)]
struct Inner {
    /// Insertion-ordered, bounded by `max_metrics`.
    metrics: VecDeque<RequestMetrics>,
    started: HashMap<String, Instant>,
}

impl Inner {
    fn find_mut(&mut self, request_id: &str) -> Option<&mut RequestMetrics> {
        self.metrics
            .iter_mut()
            .rev()
            .find(|m| m.request_id == request_id)
    }
}

impl RequestAnalytics {
    pub fn new(config: AnalyticsConfig) -> Self {
        Self {
            inner: RwLock::new(Inner {
                metrics: VecDeque::with_capacity(config.max_metrics.min(1024)),
                started: HashMap::new(),
            }),
            health: DashMap::new(),
            config,
        }
    }

    pub fn config(&self) -> &AnalyticsConfig {
        &self.config
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Begin tracking a dispatched request.
    pub fn track_request_start(&self, metadata: &RequestMetadata) {
        if !self.config.enabled {
            return;
        }

        let mut inner = self.inner.write();
        inner
            .started
            .insert(metadata.request_id.clone(), Instant::now());
        inner.metrics.push_back(RequestMetrics::started(metadata));

        while inner.metrics.len() > self.config.max_metrics {
            if let Some(evicted) = inner.metrics.pop_front() {
                inner.started.remove(&evicted.request_id);
            }
        }
    }

    /// Complete a tracked request and fold it into its service's health.
    ///
    /// Unknown or already completed ids are ignored.
    pub fn track_request_end(
        &self,
        request_id: &str,
        status_code: Option<u16>,
        success: bool,
        error_type: Option<ErrorKind>,
    ) {
        if !self.config.enabled {
            return;
        }

        let completed = {
            let mut inner = self.inner.write();
            let started = inner.started.remove(request_id);

            match (inner.find_mut(request_id), started) {
                (Some(metrics), Some(started)) if !metrics.is_complete() => {
                    let duration_ms = started.elapsed().as_millis() as u64;
                    metrics.end_time = Some(Utc::now());
                    metrics.duration_ms = Some(duration_ms);
                    metrics.status_code = status_code;
                    metrics.success = success;
                    metrics.error_type = error_type;
                    Some(metrics.clone())
                }
                _ => None,
            }
        };

        let Some(metrics) = completed else {
            debug!(request_id, "track_request_end for unknown request");
            return;
        };

        let duration_ms = metrics.duration_ms.unwrap_or_default();
        self.health
            .entry(metrics.service)
            .or_insert_with(|| ServiceHealth::new(metrics.service))
            .record(duration_ms, success, self.config.max_error_rate);

        self.check_response_time(&metrics, duration_ms);
    }

    /// Count one retry of a tracked request.
    pub fn track_retry(&self, request_id: &str) {
        if !self.config.enabled {
            return;
        }

        let mut inner = self.inner.write();
        let Some(metrics) = inner.find_mut(request_id) else {
            return;
        };
        metrics.retry_count += 1;

        if metrics.retry_count > self.config.max_retries {
            warn!(
                request_id,
                service = %metrics.service,
                endpoint = %metrics.endpoint,
                retries = metrics.retry_count,
                max_retries = self.config.max_retries,
                "request exceeded retry threshold"
            );
        }
    }

    fn check_response_time(&self, metrics: &RequestMetrics, duration_ms: u64) {
        if duration_ms > self.config.critical_response_ms {
            warn!(
                request_id = %metrics.request_id,
                service = %metrics.service,
                endpoint = %metrics.endpoint,
                duration_ms,
                threshold_ms = self.config.critical_response_ms,
                "critical response time"
            );
        } else if duration_ms > self.config.warning_response_ms {
            warn!(
                request_id = %metrics.request_id,
                service = %metrics.service,
                endpoint = %metrics.endpoint,
                duration_ms,
                threshold_ms = self.config.warning_response_ms,
                "slow response time"
            );
        }
    }

    /// Retained metric for a request id.
    pub fn request(&self, request_id: &str) -> Option<RequestMetrics> {
        self.inner
            .read()
            .metrics
            .iter()
            .rev()
            .find(|m| m.request_id == request_id)
            .cloned()
    }

    /// Retained metrics, oldest first.
    pub fn metrics(&self) -> Vec<RequestMetrics> {
        self.inner.read().metrics.iter().cloned().collect()
    }

    pub fn service_health(&self, service: ServiceName) -> Option<ServiceHealth> {
        self.health.get(&service).map(|entry| entry.value().clone())
    }

    /// A service with no completed requests is considered healthy.
    pub fn is_service_healthy(&self, service: ServiceName) -> bool {
        self.health
            .get(&service)
            .map(|entry| entry.is_healthy)
            .unwrap_or(true)
    }

    pub fn all_service_health(&self) -> Vec<ServiceHealth> {
        let mut health: Vec<ServiceHealth> =
            self.health.iter().map(|entry| entry.value().clone()).collect();
        health.sort_by_key(|h| h.service);
        health
    }

    /// Summary over completed retained metrics.
    pub fn summary(&self) -> AnalyticsSummary {
        let inner = self.inner.read();
        summarize(inner.metrics.iter().filter(|m| m.is_complete()))
    }

    pub fn snapshot(&self) -> AnalyticsSnapshot {
        AnalyticsSnapshot {
            metrics: self.metrics(),
            service_health: self.all_service_health(),
            summary: self.summary(),
            generated_at: Utc::now(),
        }
    }

    /// Drop all metrics and health entries
    pub fn reset(&self) {
        let mut inner = self.inner.write();
        inner.metrics.clear();
        inner.started.clear();
        self.health.clear();
    }
}

impl Default for RequestAnalytics {
    fn default() -> Self {
        Self::new(AnalyticsConfig::default())
    }
}

#[derive(Default)]
struct EndpointData {
    requests: u64,
    errors: u64,
    total_ms: u64,
}

fn summarize<'a>(completed: impl Iterator<Item = &'a RequestMetrics>) -> AnalyticsSummary {
    let mut total = 0u64;
    let mut failed = 0u64;
    let mut total_ms = 0u64;
    let mut endpoints: HashMap<(ServiceName, &str), EndpointData> = HashMap::new();

    for metrics in completed {
        let duration = metrics.duration_ms.unwrap_or_default();
        total += 1;
        total_ms += duration;
        if !metrics.success {
            failed += 1;
        }

        let data = endpoints
            .entry((metrics.service, metrics.endpoint.as_str()))
            .or_default();
        data.requests += 1;
        data.total_ms += duration;
        if !metrics.success {
            data.errors += 1;
        }
    }

    if total == 0 {
        return AnalyticsSummary::default();
    }

    let stats: Vec<EndpointStat> = endpoints
        .into_iter()
        .map(|((service, endpoint), data)| EndpointStat {
            service,
            endpoint: endpoint.to_string(),
            requests: data.requests,
            average_response_time: data.total_ms as f64 / data.requests as f64,
            error_rate: data.errors as f64 / data.requests as f64 * 100.0,
        })
        .collect();

    AnalyticsSummary {
        total_requests: total,
        average_response_time: total_ms as f64 / total as f64,
        error_rate: failed as f64 / total as f64 * 100.0,
        slowest_endpoints: top_by(&stats, |s| s.average_response_time),
        error_prone_endpoints: top_by(&stats, |s| s.error_rate),
    }
}

fn top_by(stats: &[EndpointStat], key: impl Fn(&EndpointStat) -> f64) -> Vec<EndpointStat> {
    let mut sorted = stats.to_vec();
    sorted.sort_by(|a, b| {
        key(b)
            .partial_cmp(&key(a))
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.endpoint.cmp(&b.endpoint))
    });
    sorted.truncate(TOP_ENDPOINTS);
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;
    use std::time::Duration;

    fn start(analytics: &RequestAnalytics, service: ServiceName, endpoint: &str) -> String {
        let metadata = RequestMetadata::new(service, &Method::GET, endpoint);
        analytics.track_request_start(&metadata);
        metadata.request_id
    }

    #[tokio::test(start_paused = true)]
    async fn test_duration_is_recorded() {
        let analytics = RequestAnalytics::default();
        let id = start(&analytics, ServiceName::Auth, "login");

        tokio::time::advance(Duration::from_millis(250)).await;
        analytics.track_request_end(&id, Some(200), true, None);

        let metrics = analytics.request(&id).unwrap();
        assert_eq!(metrics.duration_ms, Some(250));
        assert_eq!(metrics.status_code, Some(200));
        assert!(metrics.success);

        let health = analytics.service_health(ServiceName::Auth).unwrap();
        assert_eq!(health.total_requests, 1);
        assert_eq!(health.average_response_time, 250.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_end_is_applied_once() {
        let analytics = RequestAnalytics::default();
        let id = start(&analytics, ServiceName::User, "profile");

        analytics.track_request_end(&id, Some(500), false, Some(ErrorKind::ServerError));
        analytics.track_request_end(&id, Some(200), true, None);

        let metrics = analytics.request(&id).unwrap();
        assert_eq!(metrics.error_type, Some(ErrorKind::ServerError));
        assert_eq!(
            analytics.service_health(ServiceName::User).unwrap().total_requests,
            1
        );
    }

    #[test]
    fn test_fifo_eviction() {
        let analytics = RequestAnalytics::new(AnalyticsConfig::builder().max_metrics(3).build());
        let ids: Vec<String> = (0..5)
            .map(|i| start(&analytics, ServiceName::Feed, &format!("posts/{}", i)))
            .collect();

        let retained = analytics.metrics();
        assert_eq!(retained.len(), 3);
        assert_eq!(retained[0].request_id, ids[2]);
        assert!(analytics.request(&ids[0]).is_none());
    }

    #[test]
    fn test_retry_count() {
        let analytics = RequestAnalytics::default();
        let id = start(&analytics, ServiceName::Chat, "messages");

        for _ in 0..5 {
            analytics.track_retry(&id);
        }
        analytics.track_retry("missing");

        assert_eq!(analytics.request(&id).unwrap().retry_count, 5);
    }

    #[test]
    fn test_disabled_is_noop() {
        let analytics = RequestAnalytics::new(AnalyticsConfig::disabled());
        let id = start(&analytics, ServiceName::Auth, "login");
        analytics.track_request_end(&id, Some(200), true, None);

        assert!(analytics.metrics().is_empty());
        assert!(analytics.service_health(ServiceName::Auth).is_none());
        assert!(analytics.is_service_healthy(ServiceName::Auth));
    }

    #[tokio::test(start_paused = true)]
    async fn test_summary_top_endpoints() {
        let analytics = RequestAnalytics::default();

        for (endpoint, delay, ok) in [
            ("a", 10, true),
            ("b", 50, false),
            ("c", 30, true),
            ("b", 70, true),
        ] {
            let id = start(&analytics, ServiceName::User, endpoint);
            tokio::time::advance(Duration::from_millis(delay)).await;
            analytics.track_request_end(&id, None, ok, None);
        }

        let summary = analytics.summary();
        assert_eq!(summary.total_requests, 4);
        assert_eq!(summary.average_response_time, 40.0);
        assert_eq!(summary.error_rate, 25.0);
        assert_eq!(summary.slowest_endpoints[0].endpoint, "b");
        assert_eq!(summary.slowest_endpoints[0].average_response_time, 60.0);
        assert_eq!(summary.error_prone_endpoints[0].endpoint, "b");
        assert_eq!(summary.error_prone_endpoints[0].error_rate, 50.0);
    }

    #[test]
    fn test_reset() {
        let analytics = RequestAnalytics::default();
        let id = start(&analytics, ServiceName::Auth, "login");
        analytics.track_request_end(&id, Some(200), true, None);

        analytics.reset();
        assert!(analytics.metrics().is_empty());
        assert!(analytics.all_service_health().is_empty());
    }
}

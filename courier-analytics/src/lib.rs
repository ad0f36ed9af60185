//! Request analytics for the Courier HTTP layer
//!
//! Observes the client's traffic without affecting it:
//!
//! - **Request metrics**: one record per logical request, with duration,
//!   status, error kind and retry count, bounded FIFO retention
//! - **Service health**: running average response time and error rate per
//!   backend service
//! - **Threshold alerts**: `warn!` events for slow responses and excessive
//!   retries
//! - **Snapshots**: serializable dump with a top-endpoints summary
//!
//! ```
//! use courier_analytics::{AnalyticsConfig, RequestAnalytics};
//! use courier_core::{RequestMetadata, ServiceName};
//!
//! let analytics = RequestAnalytics::new(AnalyticsConfig::default());
//! let metadata = RequestMetadata::new(ServiceName::Auth, &http::Method::POST, "login");
//!
//! analytics.track_request_start(&metadata);
//! analytics.track_request_end(&metadata.request_id, Some(200), true, None);
//!
//! assert!(analytics.is_service_healthy(ServiceName::Auth));
//! ```

pub mod collector;
pub mod config;
pub mod error;
pub mod metrics;

pub use collector::RequestAnalytics;
pub use config::{AnalyticsConfig, AnalyticsConfigBuilder};
pub use error::{AnalyticsError, Result};
pub use metrics::{AnalyticsSnapshot, AnalyticsSummary, EndpointStat, RequestMetrics, ServiceHealth};

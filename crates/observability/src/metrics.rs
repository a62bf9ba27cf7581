//! Prometheus metrics infrastructure
//!
//! Installs the global Prometheus recorder and provides the HTTP request
//! metrics recorded for every call the server handles:
//!
//! * `http_requests_total{method, route, status}` - completed requests
//! * `http_request_duration_seconds{method, route}` - request latency
//! * `http_requests_in_flight` - requests currently being handled

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder};
use std::net::SocketAddr;
use std::time::Instant;

/// Latency buckets for every `*_duration_seconds` histogram, in seconds.
/// Device round-trips can take tens of seconds.
const DURATION_BUCKETS: &[f64] = &[
    0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0,
];

/// Status label used when a request is dropped before it produced a response
pub const STATUS_CANCELLED: &str = "cancelled";

/// Initialize the Prometheus metrics exporter
///
/// Starts an HTTP listener on `addr` serving the scrape endpoint.
///
/// # Example
///
/// ```ignore
/// observability::metrics::init_metrics("0.0.0.0:9090".parse()?)?;
/// // Metrics available at http://localhost:9090/metrics
/// ```
pub fn init_metrics(addr: SocketAddr) -> anyhow::Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .set_buckets_for_metric(Matcher::Suffix("duration_seconds".to_string()), DURATION_BUCKETS)?
        .install()?;

    tracing::info!(%addr, "Metrics server listening");
    Ok(())
}

/// HTTP request metrics for one server
#[derive(Debug, Clone)]
pub struct HttpMetrics {
    server_name: String,
}

impl HttpMetrics {
    pub fn new(server_name: impl Into<String>) -> Self {
        Self {
            server_name: server_name.into(),
        }
    }

    pub fn server_name(&self) -> &str {
        &self.server_name
    }

    /// Start measuring one request
    pub fn start_request(&self, method: impl Into<String>, route: impl Into<String>) -> RequestMetricsGuard {
        gauge!("http_requests_in_flight", "server" => self.server_name.clone()).increment(1.0);
        RequestMetricsGuard {
            server_name: self.server_name.clone(),
            method: method.into(),
            route: route.into(),
            status: None,
            start: Instant::now(),
        }
    }
}

/// Request metrics guard that records the request when dropped
///
/// A guard dropped without a status (the client went away mid-request) is
/// recorded with status `cancelled`.
///
/// # Example
///
/// ```ignore
/// let metrics = HttpMetrics::new("http");
/// {
///     let mut guard = metrics.start_request("GET", "/health");
///     // ... handle request ...
///     guard.set_status(200);
/// } // recorded here
/// ```
pub struct RequestMetricsGuard {
    server_name: String,
    method: String,
    route: String,
    status: Option<u16>,
    start: Instant,
}

impl RequestMetricsGuard {
    /// Set the response status (call before drop)
    pub fn set_status(&mut self, status: u16) {
        self.status = Some(status);
    }

    fn status_label(&self) -> String {
        self.status
            .map(|s| s.to_string())
            .unwrap_or_else(|| STATUS_CANCELLED.to_string())
    }
}

impl Drop for RequestMetricsGuard {
    fn drop(&mut self) {
        let status = self.status_label();
        counter!(
            "http_requests_total",
            "server" => self.server_name.clone(),
            "method" => self.method.clone(),
            "route" => self.route.clone(),
            "status" => status
        )
        .increment(1);
        histogram!(
            "http_request_duration_seconds",
            "server" => self.server_name.clone(),
            "method" => self.method.clone(),
            "route" => self.route.clone()
        )
        .record(self.start.elapsed().as_secs_f64());
        gauge!("http_requests_in_flight", "server" => self.server_name.clone()).decrement(1.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_status_label() {
        // No recorder installed, so metric calls are no-ops
        let metrics = HttpMetrics::new("http");
        assert_eq!(metrics.server_name(), "http");

        let mut guard = metrics.start_request("GET", "/health");
        assert_eq!(guard.status_label(), STATUS_CANCELLED);
        guard.set_status(200);
        assert_eq!(guard.status_label(), "200");
    }
}

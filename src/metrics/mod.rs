// Private module declaration
mod server;

use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry};
use std::time::Duration;

// Re-export for public API
pub use server::configure;

// ============================================================================
// Metrics Module - Prometheus metrics for observability
// ============================================================================
//
// Provides metrics for:
// - Repository operations (outcome counts, latency)
// - HTTP requests by route and status
//
// All metrics are registered with Prometheus and can be scraped via /metrics
// ============================================================================

/// Central metrics registry for the entire application
pub struct Metrics {
    registry: Registry,

    // Repository Metrics
    pub repository_operations: IntCounterVec,
    pub repository_duration: HistogramVec,

    // HTTP Metrics
    pub http_requests: IntCounterVec,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let repository_operations = IntCounterVec::new(
            Opts::new("repository_operations_total", "Total repository operations by outcome"),
            &["operation", "outcome"],
        )?;
        registry.register(Box::new(repository_operations.clone()))?;

        let repository_duration = HistogramVec::new(
            HistogramOpts::new("repository_operation_duration_seconds", "Repository operation duration")
                .buckets(vec![0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
            &["operation"],
        )?;
        registry.register(Box::new(repository_duration.clone()))?;

        let http_requests = IntCounterVec::new(
            Opts::new("http_requests_total", "Total HTTP requests handled"),
            &["route", "status"],
        )?;
        registry.register(Box::new(http_requests.clone()))?;

        Ok(Self {
            registry,
            repository_operations,
            repository_duration,
            http_requests,
        })
    }

    /// Get the Prometheus registry for exposing metrics via HTTP
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Helper to record one repository call
    pub fn record_repository_op(&self, operation: &str, outcome: &str, elapsed: Duration) {
        self.repository_operations
            .with_label_values(&[operation, outcome])
            .inc();
        self.repository_duration
            .with_label_values(&[operation])
            .observe(elapsed.as_secs_f64());
    }

    /// Helper to record an HTTP response
    pub fn record_request(&self, route: &str, status: u16) {
        self.http_requests
            .with_label_values(&[route, &status.to_string()])
            .inc();
    }
}

//! Prometheus-backed metrics registry and snapshot helpers.
//!
//! # Design
//! - Encapsulates collector registration to keep the public API small.
//! - Exposes a minimal set of counters/gauges relevant to the build service.

use anyhow::{Context, Result};
use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use serde::Serialize;

/// Prometheus-backed metrics registry shared across services.
#[derive(Clone)]
pub struct Metrics {
    inner: std::sync::Arc<MetricsInner>,
}

struct MetricsInner {
    registry: Registry,
    http_requests_total: IntCounterVec,
    events_emitted_total: IntCounterVec,
    build_stages_total: IntCounterVec,
    active_builds: IntGauge,
    builds_accepted_total: IntCounter,
    builds_completed_total: IntCounter,
    builds_failed_total: IntCounter,
}

/// Snapshot of selected gauges and counters for health reporting.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    /// Builds currently tracked as in-flight.
    pub active_builds: i64,
    /// Total builds accepted since process start.
    pub builds_accepted_total: u64,
    /// Total builds that completed successfully.
    pub builds_completed_total: u64,
    /// Total builds that ended in failure.
    pub builds_failed_total: u64,
}

impl Metrics {
    /// Construct a new metrics registry with the standard collectors registered.
    ///
    /// # Errors
    ///
    /// Returns an error if any of the Prometheus collectors cannot be
    /// registered.
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let http_requests_total = IntCounterVec::new(
            Opts::new("http_requests_total", "Total HTTP requests received"),
            &["route", "code"],
        )?;
        let events_emitted_total = IntCounterVec::new(
            Opts::new("events_emitted_total", "Domain events emitted by type"),
            &["type"],
        )?;
        let build_stages_total = IntCounterVec::new(
            Opts::new(
                "build_stages_total",
                "Build pipeline stages executed by status",
            ),
            &["stage", "status"],
        )?;
        let active_builds =
            IntGauge::with_opts(Opts::new("active_builds", "Number of in-flight builds"))?;
        let builds_accepted_total = IntCounter::with_opts(Opts::new(
            "builds_accepted_total",
            "Build submissions accepted",
        ))?;
        let builds_completed_total = IntCounter::with_opts(Opts::new(
            "builds_completed_total",
            "Builds that produced an artifact",
        ))?;
        let builds_failed_total = IntCounter::with_opts(Opts::new(
            "builds_failed_total",
            "Builds that ended in failure",
        ))?;

        registry.register(Box::new(http_requests_total.clone()))?;
        registry.register(Box::new(events_emitted_total.clone()))?;
        registry.register(Box::new(build_stages_total.clone()))?;
        registry.register(Box::new(active_builds.clone()))?;
        registry.register(Box::new(builds_accepted_total.clone()))?;
        registry.register(Box::new(builds_completed_total.clone()))?;
        registry.register(Box::new(builds_failed_total.clone()))?;

        Ok(Self {
            inner: std::sync::Arc::new(MetricsInner {
                registry,
                http_requests_total,
                events_emitted_total,
                build_stages_total,
                active_builds,
                builds_accepted_total,
                builds_completed_total,
                builds_failed_total,
            }),
        })
    }

    /// Increment the HTTP request counter for the given route and status code.
    pub fn inc_http_request(&self, route: &str, status: u16) {
        self.inner
            .http_requests_total
            .with_label_values(&[route, &status.to_string()])
            .inc();
    }

    /// Increment the emitted event counter for the specific event type.
    pub fn inc_event(&self, event_type: &str) {
        self.inner
            .events_emitted_total
            .with_label_values(&[event_type])
            .inc();
    }

    /// Increment the build pipeline stage counter.
    pub fn inc_build_stage(&self, stage: &str, status: &str) {
        self.inner
            .build_stages_total
            .with_label_values(&[stage, status])
            .inc();
    }

    /// Set the in-flight build gauge.
    pub fn set_active_builds(&self, count: i64) {
        self.inner.active_builds.set(count);
    }

    /// Count one accepted submission.
    pub fn inc_build_accepted(&self) {
        self.inner.builds_accepted_total.inc();
    }

    /// Count one completed build.
    pub fn inc_build_completed(&self) {
        self.inner.builds_completed_total.inc();
    }

    /// Count one failed build.
    pub fn inc_build_failed(&self) {
        self.inner.builds_failed_total.inc();
    }

    /// Render the metrics registry using the Prometheus text exposition format.
    ///
    /// # Errors
    ///
    /// Returns an error if the metrics cannot be encoded or if the encoded
    /// buffer is not valid UTF-8.
    pub fn render(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.inner.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .context("failed to encode Prometheus metrics")?;
        String::from_utf8(buffer).context("metrics output was not valid UTF-8")
    }

    /// Take a point-in-time snapshot of the most relevant gauges and counters.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            active_builds: self.inner.active_builds.get(),
            builds_accepted_total: self.inner.builds_accepted_total.get(),
            builds_completed_total: self.inner.builds_completed_total.get(),
            builds_failed_total: self.inner.builds_failed_total.get(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metrics_snapshot_reflects_updates() -> Result<()> {
        let metrics = Metrics::new()?;
        metrics.inc_http_request("/health", 200);
        metrics.inc_event("build_accepted");
        metrics.inc_build_stage("compile", "completed");
        metrics.set_active_builds(3);
        metrics.inc_build_accepted();
        metrics.inc_build_completed();
        metrics.inc_build_failed();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.active_builds, 3);
        assert_eq!(snapshot.builds_accepted_total, 1);
        assert_eq!(snapshot.builds_completed_total, 1);
        assert_eq!(snapshot.builds_failed_total, 1);

        let rendered = metrics.render()?;
        assert!(rendered.contains("http_requests_total"));
        assert!(rendered.contains("build_stages_total"));
        assert!(rendered.contains("builds_accepted_total"));
        Ok(())
    }
}

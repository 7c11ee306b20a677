//! Metrics and observability utilities
//!
//! Prometheus-style counters and histograms under a shared prefix.

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use std::time::Instant;

/// Metrics prefix for all PactForge metrics
pub const METRICS_PREFIX: &str = "pactforge";

/// Histogram buckets for request latency (in seconds)
pub const LATENCY_BUCKETS: &[f64] = &[
    0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.000, 2.500, 5.000, 10.00,
];

/// Register all metric descriptions
pub fn register_metrics() {
    describe_counter!(
        format!("{}_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Total number of HTTP requests"
    );

    describe_histogram!(
        format!("{}_request_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "HTTP request latency in seconds"
    );

    describe_counter!(
        format!("{}_layouts_generated_total", METRICS_PREFIX),
        Unit::Count,
        "Contract layouts generated, by output format"
    );

    describe_counter!(
        format!("{}_approval_transitions_total", METRICS_PREFIX),
        Unit::Count,
        "Approval state transitions, by item kind and target status"
    );

    describe_counter!(
        format!("{}_template_versions_total", METRICS_PREFIX),
        Unit::Count,
        "Template versions appended to history"
    );

    describe_counter!(
        format!("{}_reminder_emails_total", METRICS_PREFIX),
        Unit::Count,
        "Reminder emails attempted, by category and outcome"
    );

    describe_histogram!(
        format!("{}_reminder_batch_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Duration of one reminder batch"
    );

    describe_counter!(
        format!("{}_notification_failures_total", METRICS_PREFIX),
        Unit::Count,
        "Best-effort notifications that could not be delivered"
    );

    describe_counter!(
        format!("{}_version_conflicts_total", METRICS_PREFIX),
        Unit::Count,
        "Optimistic concurrency conflicts on template and contract writes"
    );

    tracing::info!("Metrics registered");
}

/// Helper to record request metrics
pub struct RequestMetrics {
    start: Instant,
    endpoint: String,
    method: String,
}

impl RequestMetrics {
    pub fn start(method: &str, endpoint: &str) -> Self {
        Self {
            start: Instant::now(),
            endpoint: endpoint.to_string(),
            method: method.to_string(),
        }
    }

    pub fn finish(self, status: u16) {
        let duration = self.start.elapsed().as_secs_f64();

        counter!(
            format!("{}_requests_total", METRICS_PREFIX),
            "method" => self.method.clone(),
            "endpoint" => self.endpoint.clone(),
            "status" => status.to_string()
        )
        .increment(1);

        histogram!(
            format!("{}_request_duration_seconds", METRICS_PREFIX),
            "method" => self.method,
            "endpoint" => self.endpoint
        )
        .record(duration);
    }
}

/// `format` is `"1.0"`, `"2.0"` or `"figma"`
pub fn record_layout(format: &str) {
    counter!(
        format!("{}_layouts_generated_total", METRICS_PREFIX),
        "format" => format.to_string()
    )
    .increment(1);
}

pub fn record_transition(kind: &str, status: &str) {
    counter!(
        format!("{}_approval_transitions_total", METRICS_PREFIX),
        "kind" => kind.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

pub fn record_template_version() {
    counter!(format!("{}_template_versions_total", METRICS_PREFIX)).increment(1);
}

pub fn record_reminder(category: &str, success: bool) {
    let outcome = if success { "sent" } else { "failed" };
    counter!(
        format!("{}_reminder_emails_total", METRICS_PREFIX),
        "category" => category.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}

pub fn record_reminder_batch(duration_secs: f64) {
    histogram!(format!("{}_reminder_batch_duration_seconds", METRICS_PREFIX)).record(duration_secs);
}

pub fn record_notification_failure(channel: &str) {
    counter!(
        format!("{}_notification_failures_total", METRICS_PREFIX),
        "channel" => channel.to_string()
    )
    .increment(1);
}

pub fn record_version_conflict(kind: &str) {
    counter!(
        format!("{}_version_conflicts_total", METRICS_PREFIX),
        "kind" => kind.to_string()
    )
    .increment(1);
}

// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Prometheus metrics for the accelerator operator.
//!
//! All metrics use the namespace prefix `aga_k8s_aws_` (prometheus-safe version of
//! "aga.k8s.aws").
//!
//! # Metrics Categories
//!
//! - **Reconciliation Metrics** - Track reconciliation operations and their outcomes
//! - **Endpoint Metrics** - Track endpoint load outcomes and DNS cache efficiency
//! - **Watch Metrics** - Track the number of live resource watches
//!
//! # Example
//!
//! ```rust,no_run
//! use accelerator_operator::metrics::record_reconciliation_success;
//!
//! record_reconciliation_success("GlobalAccelerator", std::time::Duration::from_secs(1));
//! ```

use prometheus::{
    CounterVec, Encoder, GaugeVec, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder,
};
use std::sync::LazyLock;
use std::time::Duration;

/// Namespace prefix for all metrics (prometheus-safe)
const METRICS_NAMESPACE: &str = "aga_k8s_aws";

/// Global Prometheus metrics registry
///
/// All metrics are registered in this registry and exposed via `/metrics` endpoint.
pub static METRICS_REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

// ============================================================================
// Reconciliation Metrics
// ============================================================================

/// Total number of reconciliations by resource type and status
///
/// Labels:
/// - `resource_type`: Kind of resource (e.g., `GlobalAccelerator`)
/// - `status`: Outcome (`success`, `error`)
pub static RECONCILIATION_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_reconciliations_total"),
        "Total number of reconciliations by resource type and status",
    );
    let counter = CounterVec::new(opts, &["resource_type", "status"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Duration of reconciliations in seconds
pub static RECONCILIATION_DURATION_SECONDS: LazyLock<HistogramVec> = LazyLock::new(|| {
    let opts = HistogramOpts::new(
        format!("{METRICS_NAMESPACE}_reconciliation_duration_seconds"),
        "Duration of reconciliations in seconds by resource type",
    )
    .buckets(vec![0.001, 0.01, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 60.0]);
    let histogram = HistogramVec::new(opts, &["resource_type"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(histogram.clone()))
        .unwrap();
    histogram
});

/// Total number of errors by resource type and reason
pub static ERRORS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_errors_total"),
        "Total number of errors by resource type and reason",
    );
    let counter = CounterVec::new(opts, &["resource_type", "error_type"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

// ============================================================================
// Endpoint Metrics
// ============================================================================

/// Total number of endpoint loads by endpoint type and resulting status
///
/// Labels:
/// - `endpoint_type`: `Service`, `Ingress`, `Gateway` or `EndpointID`
/// - `status`: `Loaded`, `Warning` or `Fatal`
pub static ENDPOINT_LOADS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_endpoint_loads_total"),
        "Total number of endpoint loads by endpoint type and status",
    );
    let counter = CounterVec::new(opts, &["endpoint_type", "status"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Total number of DNS name to ARN cache lookups
///
/// Labels:
/// - `result`: `hit` or `miss`
pub static DNS_CACHE_LOOKUPS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_dns_cache_lookups_total"),
        "Total number of DNS name to load balancer ARN cache lookups by result",
    );
    let counter = CounterVec::new(opts, &["result"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

// ============================================================================
// Watch Metrics
// ============================================================================

/// Number of live watches on referenced resources
///
/// Labels:
/// - `resource_kind`: `Service`, `Ingress` or `Gateway`
pub static ACTIVE_RESOURCE_WATCHES: LazyLock<GaugeVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_active_resource_watches"),
        "Number of live watches on referenced resources by kind",
    );
    let gauge = GaugeVec::new(opts, &["resource_kind"]).unwrap();
    METRICS_REGISTRY.register(Box::new(gauge.clone())).unwrap();
    gauge
});

// ============================================================================
// Helper Functions
// ============================================================================

/// Record a successful reconciliation
pub fn record_reconciliation_success(resource_type: &str, duration: Duration) {
    RECONCILIATION_TOTAL
        .with_label_values(&[resource_type, "success"])
        .inc();
    RECONCILIATION_DURATION_SECONDS
        .with_label_values(&[resource_type])
        .observe(duration.as_secs_f64());
}

/// Record a failed reconciliation
pub fn record_reconciliation_error(resource_type: &str, duration: Duration) {
    RECONCILIATION_TOTAL
        .with_label_values(&[resource_type, "error"])
        .inc();
    RECONCILIATION_DURATION_SECONDS
        .with_label_values(&[resource_type])
        .observe(duration.as_secs_f64());
}

/// Record an error by reason
pub fn record_error(resource_type: &str, error_type: &str) {
    ERRORS_TOTAL
        .with_label_values(&[resource_type, error_type])
        .inc();
}

/// Record the outcome of loading one endpoint
pub fn record_endpoint_load(endpoint_type: &str, status: &str) {
    ENDPOINT_LOADS_TOTAL
        .with_label_values(&[endpoint_type, status])
        .inc();
}

/// Record a DNS cache lookup
pub fn record_dns_cache_lookup(hit: bool) {
    let result = if hit { "hit" } else { "miss" };
    DNS_CACHE_LOOKUPS_TOTAL.with_label_values(&[result]).inc();
}

/// Set the number of live watches for a resource kind
#[allow(clippy::cast_precision_loss)]
pub fn set_active_watches(resource_kind: &str, count: usize) {
    ACTIVE_RESOURCE_WATCHES
        .with_label_values(&[resource_kind])
        .set(count as f64);
}

/// Gather and encode all metrics in Prometheus text format
///
/// # Errors
/// Returns error if encoding fails
pub fn gather_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = METRICS_REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(format!("UTF-8 error: {e}")))
}

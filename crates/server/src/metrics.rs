//! Prometheus metrics
//!
//! The recorder is installed once per process; `/metrics` renders it.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

static PROMETHEUS_HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

const TURN_DURATION_BUCKETS: &[f64] = &[0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0];

/// Install the Prometheus recorder
///
/// Returns `None` if the exporter could not be installed (for example when
/// another recorder already owns the global slot).
pub fn init_metrics() -> Option<PrometheusHandle> {
    let result = PROMETHEUS_HANDLE.get_or_try_init(|| {
        PrometheusBuilder::new()
            .set_buckets_for_metric(
                Matcher::Full("honeypot_turn_duration_seconds".to_string()),
                TURN_DURATION_BUCKETS,
            )?
            .install_recorder()
    });

    match result {
        Ok(handle) => Some(handle.clone()),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to install Prometheus recorder");
            None
        }
    }
}

/// `GET /metrics`
pub async fn metrics_handler() -> Response {
    match PROMETHEUS_HANDLE.get() {
        Some(handle) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => (StatusCode::SERVICE_UNAVAILABLE, "Metrics not initialized").into_response(),
    }
}

/// Count a request answered with the fail-open fallback
pub fn record_fail_open(reason: &'static str) {
    metrics::counter!("honeypot_fail_open_total", "reason" => reason).increment(1);
}

pub fn record_active_sessions(count: usize) {
    metrics::gauge!("honeypot_active_sessions").set(count as f64);
}

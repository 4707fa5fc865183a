//! Prometheus metrics for postboard-service.
//!
//! Collectors register against the default registry on first use and are
//! rendered by [`serve_metrics`] at `/metrics`.

use actix_web::HttpResponse;
use once_cell::sync::Lazy;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, Encoder, HistogramVec, IntCounterVec,
    TextEncoder,
};
use std::time::Duration;

/// HTTP request latency by route pattern
static HTTP_REQUEST_DURATION_SECONDS: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "postboard_http_request_duration_seconds",
        "HTTP request duration by method, route and status",
        &["method", "path", "status"],
        vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]
    )
    .expect("failed to register postboard_http_request_duration_seconds")
});

/// Trigger invocations by outcome (applied/skipped/failed)
static TRIGGER_INVOCATIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "postboard_trigger_invocations_total",
        "Reactive trigger invocations by trigger and outcome",
        &["trigger", "outcome"]
    )
    .expect("failed to register postboard_trigger_invocations_total")
});

static TRIGGER_DURATION_SECONDS: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "postboard_trigger_duration_seconds",
        "Reactive trigger execution time",
        &["trigger"],
        vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]
    )
    .expect("failed to register postboard_trigger_duration_seconds")
});

/// Change events skipped because the trigger runtime fell behind
static TRIGGER_EVENTS_LAGGED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "postboard_trigger_events_lagged_total",
        "Change events dropped by a lagging trigger runtime",
        &["reason"]
    )
    .expect("failed to register postboard_trigger_events_lagged_total")
});

pub fn record_http_request(method: &str, path: &str, status: u16, duration: Duration) {
    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, path, &status.to_string()])
        .observe(duration.as_secs_f64());
}

pub fn record_trigger(trigger: &str, outcome: &str, duration: Duration) {
    TRIGGER_INVOCATIONS_TOTAL
        .with_label_values(&[trigger, outcome])
        .inc();
    TRIGGER_DURATION_SECONDS
        .with_label_values(&[trigger])
        .observe(duration.as_secs_f64());
}

pub fn record_lagged_events(skipped: u64) {
    TRIGGER_EVENTS_LAGGED_TOTAL
        .with_label_values(&["lagged"])
        .inc_by(skipped);
}

/// Current count for one trigger outcome.
pub fn trigger_invocations(trigger: &str, outcome: &str) -> u64 {
    TRIGGER_INVOCATIONS_TOTAL
        .with_label_values(&[trigger, outcome])
        .get()
}

/// Actix handler that renders Prometheus metrics in text format.
pub async fn serve_metrics() -> HttpResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        return HttpResponse::InternalServerError().body(err.to_string());
    }

    HttpResponse::Ok()
        .content_type(encoder.format_type())
        .body(buffer)
}

//! Prometheus metric exposition (§4.9): request counter, latency
//! histogram, and an in-flight gauge, registered as global middleware.
//! Served as text at `GET /metrics`.

use std::sync::OnceLock;
use std::time::Instant;

use anyhow::{Context, Result};
use axum::extract::{MatchedPath, Request};
use axum::middleware::Next;
use axum::response::Response;
use prometheus::{
    register_counter_vec, register_gauge, register_histogram_vec, CounterVec, Encoder, Gauge,
    HistogramVec, TextEncoder,
};

static REQUESTS_TOTAL: OnceLock<CounterVec> = OnceLock::new();
static REQUEST_DURATION: OnceLock<HistogramVec> = OnceLock::new();
static REQUESTS_IN_FLIGHT: OnceLock<Gauge> = OnceLock::new();
static INIT_RESULT: OnceLock<Result<()>> = OnceLock::new();

/// Register the gateway's metrics. Idempotent; safe to call more than
/// once (e.g. across tests in the same process).
pub fn init_metrics() -> Result<()> {
    match INIT_RESULT.get_or_init(init_metrics_internal) {
        Ok(()) => Ok(()),
        Err(e) => Err(anyhow::anyhow!("metrics initialization failed: {e}")),
    }
}

fn init_metrics_internal() -> Result<()> {
    if REQUESTS_TOTAL.get().is_some() {
        return Ok(());
    }

    let requests_total = register_counter_vec!(
        "a2a_gateway_requests_total",
        "Total number of HTTP requests handled",
        &["method", "path", "status"]
    )
    .context("failed to register a2a_gateway_requests_total")?;

    let request_duration = register_histogram_vec!(
        "a2a_gateway_request_duration_seconds",
        "HTTP request duration in seconds",
        &["method", "path"]
    )
    .context("failed to register a2a_gateway_request_duration_seconds")?;

    let requests_in_flight = register_gauge!(
        "a2a_gateway_requests_in_flight",
        "Number of HTTP requests currently being handled"
    )
    .context("failed to register a2a_gateway_requests_in_flight")?;

    REQUESTS_TOTAL
        .set(requests_total)
        .map_err(|_| anyhow::anyhow!("a2a_gateway_requests_total already set"))?;
    REQUEST_DURATION
        .set(request_duration)
        .map_err(|_| anyhow::anyhow!("a2a_gateway_request_duration_seconds already set"))?;
    REQUESTS_IN_FLIGHT
        .set(requests_in_flight)
        .map_err(|_| anyhow::anyhow!("a2a_gateway_requests_in_flight already set"))?;

    Ok(())
}

/// Render the registered metrics in Prometheus text exposition format.
#[must_use]
pub fn render() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if encoder.encode(&metric_families, &mut buffer).is_err() {
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

/// Axum middleware recording the request counter, latency histogram, and
/// in-flight gauge for every request. Must not buffer the response body —
/// SSE streams rely on incremental flushing staying intact through this
/// layer (§4.9).
pub async fn track_metrics(request: Request, next: Next) -> Response {
    let method = request.method().to_string();
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());

    if let Some(in_flight) = REQUESTS_IN_FLIGHT.get() {
        in_flight.inc();
    }
    let start = Instant::now();

    let response = next.run(request).await;

    let duration = start.elapsed().as_secs_f64();
    let status = response.status().as_u16().to_string();

    if let Some(in_flight) = REQUESTS_IN_FLIGHT.get() {
        in_flight.dec();
    }
    if let Some(requests_total) = REQUESTS_TOTAL.get() {
        requests_total.with_label_values(&[&method, &path, &status]).inc();
    }
    if let Some(request_duration) = REQUEST_DURATION.get() {
        request_duration.with_label_values(&[&method, &path]).observe(duration);
    }

    response
}

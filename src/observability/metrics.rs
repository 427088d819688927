//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): inbound requests by outcome
//! - `gateway_request_duration_seconds` (histogram): inbound latency
//! - `gateway_upstream_calls_total` (counter): upstream invocations by result
//! - `gateway_upstream_retries_total` (counter): retry attempts
//! - `gateway_breaker_transitions_total` (counter): phase changes
//! - `gateway_breaker_state` (gauge): 0=closed, 1=open, 2=half-open
//! - `gateway_breaker_denied_total` (counter): calls refused by the breaker
//! - `gateway_fallbacks_total` (counter): degraded responses by reason
//!
//! Recording is a no-op until a recorder is installed, so tests and
//! deployments without the exporter pay nothing.

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(outcome: &'static str, start_time: Instant) {
    counter!("gateway_requests_total", "outcome" => outcome).increment(1);
    histogram!("gateway_request_duration_seconds").record(start_time.elapsed().as_secs_f64());
}

pub fn record_upstream_call(upstream: &str, result: &'static str) {
    counter!(
        "gateway_upstream_calls_total",
        "upstream" => upstream.to_string(),
        "result" => result
    )
    .increment(1);
}

pub fn record_retry(upstream: &str) {
    counter!("gateway_upstream_retries_total", "upstream" => upstream.to_string()).increment(1);
}

pub fn record_breaker_transition(breaker: &str, from: &'static str, to: &'static str, state: f64) {
    counter!(
        "gateway_breaker_transitions_total",
        "breaker" => breaker.to_string(),
        "from" => from,
        "to" => to
    )
    .increment(1);
    record_breaker_state(breaker, state);
}

pub fn record_breaker_state(breaker: &str, state: f64) {
    gauge!("gateway_breaker_state", "breaker" => breaker.to_string()).set(state);
}

pub fn record_breaker_denied(breaker: &str) {
    counter!("gateway_breaker_denied_total", "breaker" => breaker.to_string()).increment(1);
}

pub fn record_fallback(reason: &'static str) {
    counter!("gateway_fallbacks_total", "reason" => reason).increment(1);
}

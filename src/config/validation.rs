//! Configuration validation.
//!
//! Serde handles the syntax; this module checks value ranges and formats.
//! Every violation is reported, not just the first.

use std::net::SocketAddr;
use thiserror::Error;
use url::Url;

use crate::config::schema::GatewayConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Validate a configuration, returning every violation found.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new("listener.bind_address", "not a socket address"));
    }
    check_path(&mut errors, "gateway.path", &config.gateway.path);
    if config.gateway.path == "/health" || config.gateway.path.starts_with("/admin") {
        errors.push(ValidationError::new("gateway.path", "collides with a reserved route"));
    }

    let upstream = &config.upstream;
    match Url::parse(&upstream.base_url) {
        Ok(url) if url.scheme() == "http" => {
            if url.host_str().is_none() {
                errors.push(ValidationError::new("upstream.base_url", "missing host"));
            }
        }
        Ok(url) => errors.push(ValidationError::new(
            "upstream.base_url",
            format!("unsupported scheme '{}'", url.scheme()),
        )),
        Err(e) => errors.push(ValidationError::new("upstream.base_url", e.to_string())),
    }
    check_path(&mut errors, "upstream.path", &upstream.path);
    if upstream.name.trim().is_empty() {
        errors.push(ValidationError::new("upstream.name", "must not be empty"));
    }
    if upstream.connect_timeout_ms == 0 {
        errors.push(ValidationError::new("upstream.connect_timeout_ms", "must be > 0"));
    }
    if upstream.max_body_bytes == 0 {
        errors.push(ValidationError::new("upstream.max_body_bytes", "must be > 0"));
    }

    let breaker = &config.circuit_breaker;
    if !(breaker.failure_rate_threshold > 0.0 && breaker.failure_rate_threshold <= 1.0) {
        errors.push(ValidationError::new(
            "circuit_breaker.failure_rate_threshold",
            "must be in (0, 1]",
        ));
    }
    if breaker.sliding_window_size == 0 {
        errors.push(ValidationError::new("circuit_breaker.sliding_window_size", "must be > 0"));
    }
    if breaker.minimum_calls == 0 {
        errors.push(ValidationError::new("circuit_breaker.minimum_calls", "must be > 0"));
    } else if breaker.minimum_calls > breaker.sliding_window_size {
        errors.push(ValidationError::new(
            "circuit_breaker.minimum_calls",
            "must not exceed sliding_window_size",
        ));
    }
    if breaker.open_state_duration_ms == 0 {
        errors.push(ValidationError::new("circuit_breaker.open_state_duration_ms", "must be > 0"));
    }
    if breaker.half_open_trial_calls == 0 {
        errors.push(ValidationError::new("circuit_breaker.half_open_trial_calls", "must be > 0"));
    }
    if breaker.call_timeout_ms == 0 {
        errors.push(ValidationError::new("circuit_breaker.call_timeout_ms", "must be > 0"));
    }

    let retries = &config.retries;
    if retries.max_attempts == 0 {
        errors.push(ValidationError::new("retries.max_attempts", "must be >= 1"));
    }
    if retries.base_delay_ms > retries.max_delay_ms {
        errors.push(ValidationError::new("retries.base_delay_ms", "must not exceed max_delay_ms"));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be > 0"));
    } else if breaker.call_timeout_ms >= config.timeouts.request_secs.saturating_mul(1_000) {
        // The outer request timeout would fire before the fallback is built.
        errors.push(ValidationError::new(
            "circuit_breaker.call_timeout_ms",
            "must be below timeouts.request_secs",
        ));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new("observability.metrics_address", "not a socket address"));
    }

    if config.admin.enabled && config.admin.api_key.is_empty() {
        errors.push(ValidationError::new("admin.api_key", "must be set when admin is enabled"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_path(errors: &mut Vec<ValidationError>, field: &'static str, path: &str) {
    if !path.starts_with('/') {
        errors.push(ValidationError::new(field, "must start with '/'"));
    }
}

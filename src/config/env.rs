//! Environment variable overrides.
//!
//! Applied after the file is parsed and before validation, so a deployment
//! can tune the breaker without shipping a new file.

use std::str::FromStr;

use crate::config::loader::ConfigError;
use crate::config::schema::GatewayConfig;

pub const BIND_ADDRESS: &str = "GATEWAY_BIND_ADDRESS";
pub const UPSTREAM_URL: &str = "GATEWAY_UPSTREAM_URL";
pub const FAILURE_RATE_THRESHOLD: &str = "GATEWAY_FAILURE_RATE_THRESHOLD";
pub const SLIDING_WINDOW_SIZE: &str = "GATEWAY_SLIDING_WINDOW_SIZE";
pub const MINIMUM_CALLS: &str = "GATEWAY_MINIMUM_CALLS";
pub const OPEN_STATE_DURATION_MS: &str = "GATEWAY_OPEN_STATE_DURATION_MS";
pub const HALF_OPEN_TRIAL_CALLS: &str = "GATEWAY_HALF_OPEN_TRIAL_CALLS";
pub const CALL_TIMEOUT_MS: &str = "GATEWAY_CALL_TIMEOUT_MS";

/// Apply overrides from the process environment.
pub fn apply_env_overrides(config: &mut GatewayConfig) -> Result<(), ConfigError> {
    apply_overrides(config, |key| std::env::var(key).ok())
}

/// Apply overrides from an arbitrary lookup.
pub fn apply_overrides<F>(config: &mut GatewayConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = lookup(BIND_ADDRESS) {
        config.listener.bind_address = value;
    }
    if let Some(value) = lookup(UPSTREAM_URL) {
        config.upstream.base_url = value;
    }

    let breaker = &mut config.circuit_breaker;
    override_parsed(&lookup, FAILURE_RATE_THRESHOLD, &mut breaker.failure_rate_threshold)?;
    override_parsed(&lookup, SLIDING_WINDOW_SIZE, &mut breaker.sliding_window_size)?;
    override_parsed(&lookup, MINIMUM_CALLS, &mut breaker.minimum_calls)?;
    override_parsed(&lookup, OPEN_STATE_DURATION_MS, &mut breaker.open_state_duration_ms)?;
    override_parsed(&lookup, HALF_OPEN_TRIAL_CALLS, &mut breaker.half_open_trial_calls)?;
    override_parsed(&lookup, CALL_TIMEOUT_MS, &mut breaker.call_timeout_ms)?;

    Ok(())
}

fn override_parsed<F, T>(lookup: &F, key: &'static str, target: &mut T) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    if let Some(raw) = lookup(key) {
        *target = raw.trim().parse().map_err(|_| ConfigError::Env { var: key, value: raw })?;
        tracing::debug!(var = key, "Applied environment override");
    }
    Ok(())
}

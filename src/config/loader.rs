//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::config::env::apply_env_overrides;
use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {var}: '{value}'")]
    Env { var: &'static str, value: String },

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse a TOML document into a configuration (no overrides, no validation).
pub fn parse_config(content: &str) -> Result<GatewayConfig, ConfigError> {
    Ok(toml::from_str(content)?)
}

/// Load the configuration file if given, apply environment overrides,
/// and validate the result.
pub fn load_config(path: Option<&Path>) -> Result<GatewayConfig, ConfigError> {
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            tracing::info!(path = %path.display(), "Loading configuration file");
            parse_config(&content)?
        }
        None => GatewayConfig::default(),
    };

    apply_env_overrides(&mut config)?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_document() {
        let config = parse_config(
            r#"
            [listener]
            bind_address = "127.0.0.1:9000"

            [gateway]
            path = "/api/orders"

            [upstream]
            name = "orders"
            base_url = "http://127.0.0.1:8080"
            path = "/orders"

            [circuit_breaker]
            failure_rate_threshold = 0.25
            sliding_window_size = 8
            minimum_calls = 4
            open_state_duration_ms = 30000
            half_open_trial_calls = 2
            call_timeout_ms = 1500

            [retries]
            enabled = true
            max_attempts = 2

            [admin]
            enabled = true
            api_key = "secret"
            "#,
        )
        .unwrap();

        assert_eq!(config.listener.bind_address, "127.0.0.1:9000");
        assert_eq!(config.gateway.path, "/api/orders");
        assert_eq!(config.circuit_breaker.half_open_trial_calls, 2);
        assert!(config.retries.enabled);
        assert_eq!(config.retries.max_attempts, 2);
        assert_eq!(config.admin.api_key, "secret");
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_parse_error_is_reported() {
        let err = parse_config("[circuit_breaker]\nsliding_window_size = \"big\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_validation_error_message_lists_fields() {
        let err = ConfigError::Validation(vec![
            ValidationError {
                field: "circuit_breaker.minimum_calls",
                message: "must be > 0".to_string(),
            },
            ValidationError {
                field: "timeouts.request_secs",
                message: "must be > 0".to_string(),
            },
        ]);
        assert_eq!(
            err.to_string(),
            "Validation failed: circuit_breaker.minimum_calls: must be > 0, timeouts.request_secs: must be > 0"
        );
    }

    #[test]
    fn test_missing_file() {
        let err = load_config(Some(Path::new("definitely/not/here.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}

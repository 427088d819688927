//! Structured logging.
//!
//! `RUST_LOG` takes precedence; otherwise the configured level applies to
//! both binaries and `tower_http`.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Build the filter used when `RUST_LOG` is unset.
pub fn default_filter(log_level: &str) -> String {
    format!(
        "order_gateway={level},order_service={level},tower_http={level}",
        level = log_level
    )
}

/// Install the global subscriber. Safe to call more than once; later calls
/// are ignored.
pub fn init_logging(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(log_level)));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter() {
        assert_eq!(default_filter("debug"), "order_gateway=debug,order_service=debug,tower_http=debug");
    }
}

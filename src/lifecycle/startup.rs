//! Startup orchestration.
//!
//! Any startup error is fatal. The listener binds last so traffic only
//! arrives once the breaker and upstream client exist.

use std::net::SocketAddr;
use tokio::net::TcpListener;

use crate::config::GatewayConfig;
use crate::http::{GatewayServer, ServerError};
use crate::lifecycle::{signals, Shutdown};
use crate::observability::metrics;

/// Run the gateway until a termination signal arrives.
pub async fn run(config: GatewayConfig) -> Result<(), ServerError> {
    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.base_url,
        failure_rate_threshold = config.circuit_breaker.failure_rate_threshold,
        sliding_window_size = config.circuit_breaker.sliding_window_size,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let server = GatewayServer::new(config)?;
    let listener = TcpListener::bind(&server.config().listener.bind_address).await?;

    let shutdown = Shutdown::new();
    let receiver = shutdown.subscribe();
    tokio::spawn(async move {
        signals::wait_for_termination().await;
        shutdown.trigger();
    });

    server.run(listener, receiver).await
}

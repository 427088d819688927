//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router with all handlers
//! - Wire up middleware (request ID, tracing, outer timeout)
//! - Build the breaker, executor and fallback for the configured upstream
//! - Serve until the shutdown signal fires

use axum::{
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::admin::{self, AdminState};
use crate::config::GatewayConfig;
use crate::gateway::{FallbackComposer, GatewayHandler, GatewayResponse};
use crate::http::request::{propagate_request_id_layer, request_id, set_request_id_layer};
use crate::observability::metrics;
use crate::orders::Order;
use crate::resilience::{CircuitBreaker, Clock, RetryPolicy, SystemClock};
use crate::upstream::{CallExecutor, HyperTransport, InvalidEndpoint, Transport, UpstreamRequest};

/// Application state injected into handlers.
pub struct AppState<T> {
    pub gateway: Arc<GatewayHandler<T>>,
}

impl<T> Clone for AppState<T> {
    fn clone(&self) -> Self {
        Self {
            gateway: Arc::clone(&self.gateway),
        }
    }
}

/// Errors raised while building or running the server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Endpoint(#[from] InvalidEndpoint),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// HTTP server for the order gateway.
pub struct GatewayServer {
    router: Router,
    config: GatewayConfig,
    breaker: Arc<CircuitBreaker>,
}

impl GatewayServer {
    /// Create a server calling the upstream over HTTP.
    pub fn new(config: GatewayConfig) -> Result<Self, ServerError> {
        let transport = HyperTransport::new(config.upstream.connect_timeout());
        Self::with_transport(config, transport, Arc::new(SystemClock))
    }

    /// Create a server with an explicit transport and clock.
    pub fn with_transport<T: Transport>(
        config: GatewayConfig,
        transport: T,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ServerError> {
        let breaker = Arc::new(CircuitBreaker::with_clock(
            config.upstream.name.clone(),
            config.circuit_breaker.clone(),
            clock,
        ));
        let executor = CallExecutor::new(
            transport,
            &config.upstream,
            config.circuit_breaker.call_timeout(),
            RetryPolicy::from_config(&config.retries),
        )?;

        tracing::info!(
            upstream = %config.upstream.name,
            endpoint = %executor.endpoint(),
            call_timeout = ?executor.call_timeout(),
            "Upstream configured"
        );

        let gateway = Arc::new(GatewayHandler::new(
            breaker.clone(),
            executor,
            FallbackComposer::new(&config.upstream.name),
        ));

        let router = Self::build_router(&config, gateway, breaker.clone());
        Ok(Self {
            router,
            config,
            breaker,
        })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router<T: Transport>(
        config: &GatewayConfig,
        gateway: Arc<GatewayHandler<T>>,
        breaker: Arc<CircuitBreaker>,
    ) -> Router {
        let mut router = Router::new()
            .route(&config.gateway.path, get(orders_handler::<T>))
            .route("/health", get(health_handler))
            .with_state(AppState { gateway });

        if config.admin.enabled {
            router = router.merge(admin::setup_admin_router(AdminState::new(
                breaker,
                &config.admin.api_key,
            )));
        }

        router.layer(
            ServiceBuilder::new()
                .layer(set_request_id_layer())
                .layer(propagate_request_id_layer())
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs))),
        )
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(self, listener: TcpListener, mut shutdown: broadcast::Receiver<()>) -> Result<(), ServerError> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            path = %self.config.gateway.path,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("HTTP server draining");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// A clone of the router, for in-process requests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn breaker(&self) -> &Arc<CircuitBreaker> {
        &self.breaker
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}

/// Serves the order collection through the breaker.
async fn orders_handler<T: Transport>(State(state): State<AppState<T>>, headers: HeaderMap) -> Response {
    let start_time = Instant::now();
    let request = UpstreamRequest {
        request_id: request_id(&headers),
    };

    let response: GatewayResponse<Vec<Order>> = state.gateway.handle(&request).await;

    tracing::debug!(
        request_id = request.request_id.as_deref().unwrap_or("unknown"),
        outcome = response.outcome_label(),
        "Request handled"
    );
    metrics::record_request(response.outcome_label(), start_time);
    response.into_response()
}

async fn health_handler() -> &'static str {
    "ok"
}

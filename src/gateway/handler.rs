//! Request orchestration.
//!
//! # Flow
//! ```text
//! try_acquire
//!     Denied    → fallback(BreakerOpen), breaker untouched
//!     Permitted → invoke → permit.record(outcome) → payload or fallback
//! ```

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

use crate::gateway::fallback::{FallbackComposer, FallbackReason, FallbackResponse};
use crate::observability::metrics;
use crate::resilience::{Admission, CircuitBreaker};
use crate::upstream::{CallExecutor, CallResult, Transport, UpstreamRequest};

/// What the gateway answers.
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayResponse<P> {
    /// Upstream data, served as 200 JSON.
    Upstream(P),
    Fallback(FallbackResponse),
}

impl<P> GatewayResponse<P> {
    pub fn is_fallback(&self) -> bool {
        matches!(self, GatewayResponse::Fallback(_))
    }

    pub fn outcome_label(&self) -> &'static str {
        match self {
            GatewayResponse::Upstream(_) => "upstream",
            GatewayResponse::Fallback(_) => "fallback",
        }
    }
}

impl<P: Serialize> IntoResponse for GatewayResponse<P> {
    fn into_response(self) -> Response {
        match self {
            GatewayResponse::Upstream(payload) => (StatusCode::OK, Json(payload)).into_response(),
            GatewayResponse::Fallback(fallback) => fallback.into_response(),
        }
    }
}

/// Breaker-guarded calls to one upstream.
pub struct GatewayHandler<T> {
    breaker: Arc<CircuitBreaker>,
    executor: CallExecutor<T>,
    fallback: FallbackComposer,
}

impl<T: Transport> GatewayHandler<T> {
    pub fn new(breaker: Arc<CircuitBreaker>, executor: CallExecutor<T>, fallback: FallbackComposer) -> Self {
        Self {
            breaker,
            executor,
            fallback,
        }
    }

    pub fn breaker(&self) -> &Arc<CircuitBreaker> {
        &self.breaker
    }

    /// Serve one request.
    pub async fn handle<P>(&self, request: &UpstreamRequest) -> GatewayResponse<P>
    where
        P: DeserializeOwned + Send,
    {
        let permit = match self.breaker.try_acquire() {
            Admission::Permitted(permit) => permit,
            Admission::Denied => {
                tracing::debug!(
                    breaker = %self.breaker.name(),
                    request_id = request.request_id.as_deref().unwrap_or("unknown"),
                    "Call denied by circuit breaker"
                );
                return self.degrade(FallbackReason::BreakerOpen);
            }
        };

        let result = self.executor.invoke::<P>(request).await;
        let _ = permit.record(result.outcome());

        match result {
            CallResult::Success(payload) => GatewayResponse::Upstream(payload),
            CallResult::Failure(kind) => self.degrade(FallbackReason::Failure(kind)),
            CallResult::Timeout => self.degrade(FallbackReason::Timeout),
        }
    }

    fn degrade<P>(&self, reason: FallbackReason) -> GatewayResponse<P> {
        metrics::record_fallback(reason.marker());
        GatewayResponse::Fallback(self.fallback.build(&reason))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CircuitBreakerConfig, UpstreamConfig};
    use crate::orders::Order;
    use crate::resilience::{ManualClock, Phase, RetryPolicy};
    use crate::upstream::testing::{Scripted, ScriptedTransport};
    use std::time::Duration;

    const ORDERS_JSON: &str = r#"[{"id":"1","name":"Order1","amount":200}]"#;

    fn breaker_config() -> CircuitBreakerConfig {
        CircuitBreakerConfig {
            failure_rate_threshold: 0.5,
            sliding_window_size: 5,
            minimum_calls: 5,
            open_state_duration_ms: 5_000,
            half_open_trial_calls: 2,
            call_timeout_ms: 200,
        }
    }

    fn gateway(transport: ScriptedTransport) -> (GatewayHandler<ScriptedTransport>, ManualClock) {
        let config = breaker_config();
        let clock = ManualClock::new();
        let breaker = Arc::new(CircuitBreaker::with_clock(
            "order-service",
            config.clone(),
            Arc::new(clock.clone()),
        ));
        let executor = CallExecutor::new(
            transport,
            &UpstreamConfig::default(),
            config.call_timeout(),
            RetryPolicy::disabled(),
        )
        .unwrap();
        let handler = GatewayHandler::new(breaker, executor, FallbackComposer::new("order-service"));
        (handler, clock)
    }

    fn marker<P>(response: &GatewayResponse<P>) -> Option<&'static str> {
        match response {
            GatewayResponse::Fallback(fallback) => Some(fallback.marker),
            GatewayResponse::Upstream(_) => None,
        }
    }

    #[tokio::test]
    async fn test_healthy_upstream_returns_payload() {
        let transport = ScriptedTransport::new([Scripted::Respond(200, ORDERS_JSON)]);
        let (gateway, _) = gateway(transport);

        let response: GatewayResponse<Vec<Order>> = gateway.handle(&UpstreamRequest::default()).await;

        match response {
            GatewayResponse::Upstream(orders) => {
                assert_eq!(orders.len(), 1);
                assert_eq!(orders[0].name, "Order1");
            }
            other => panic!("expected upstream payload, got {:?}", other),
        }
        assert_eq!(gateway.breaker().snapshot().window_len, 1);
    }

    #[tokio::test]
    async fn test_failures_open_breaker_and_skip_network() {
        let transport = ScriptedTransport::new((0..5).map(|_| Scripted::Respond(500, "boom")));
        let (gateway, _) = gateway(transport.clone());

        for _ in 0..5 {
            let response: GatewayResponse<Vec<Order>> = gateway.handle(&UpstreamRequest::default()).await;
            assert_eq!(marker(&response), Some("upstream-failure"));
        }
        assert_eq!(gateway.breaker().phase(), Phase::Open);
        assert_eq!(transport.calls(), 5);

        let response: GatewayResponse<Vec<Order>> = gateway.handle(&UpstreamRequest::default()).await;
        assert_eq!(marker(&response), Some("breaker-open"));
        assert_eq!(transport.calls(), 5);
    }

    #[tokio::test]
    async fn test_denied_requests_leave_breaker_untouched() {
        let transport = ScriptedTransport::new((0..5).map(|_| Scripted::Fail("refused")));
        let (gateway, _) = gateway(transport);

        for _ in 0..5 {
            let _: GatewayResponse<Vec<Order>> = gateway.handle(&UpstreamRequest::default()).await;
        }
        let before = gateway.breaker().snapshot();

        for _ in 0..3 {
            let _: GatewayResponse<Vec<Order>> = gateway.handle(&UpstreamRequest::default()).await;
        }
        let after = gateway.breaker().snapshot();

        assert_eq!(before.window_len, after.window_len);
        assert_eq!(before.failures, after.failures);
        assert_eq!(before.stats.permitted, after.stats.permitted);
        assert_eq!(after.stats.denied, before.stats.denied + 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_recorded_as_failure() {
        let transport = ScriptedTransport::new([Scripted::Hang]);
        let (gateway, _) = gateway(transport);

        let response: GatewayResponse<Vec<Order>> = gateway.handle(&UpstreamRequest::default()).await;

        assert_eq!(marker(&response), Some("upstream-timeout"));
        let snapshot = gateway.breaker().snapshot();
        assert_eq!(snapshot.window_len, 1);
        assert_eq!(snapshot.failures, 1);
    }

    #[tokio::test]
    async fn test_recovers_after_successful_trials() {
        let transport = ScriptedTransport::new((0..5).map(|_| Scripted::Respond(503, "down")));
        let (gateway, clock) = gateway(transport.clone());

        for _ in 0..5 {
            let _: GatewayResponse<Vec<Order>> = gateway.handle(&UpstreamRequest::default()).await;
        }
        assert_eq!(gateway.breaker().phase(), Phase::Open);

        clock.advance(Duration::from_secs(5));
        transport.push(Scripted::Respond(200, ORDERS_JSON));
        transport.push(Scripted::Respond(200, ORDERS_JSON));

        let first: GatewayResponse<Vec<Order>> = gateway.handle(&UpstreamRequest::default()).await;
        assert!(!first.is_fallback());
        assert_eq!(gateway.breaker().phase(), Phase::HalfOpen);

        let second: GatewayResponse<Vec<Order>> = gateway.handle(&UpstreamRequest::default()).await;
        assert!(!second.is_fallback());
        assert_eq!(gateway.breaker().phase(), Phase::Closed);
    }

    #[tokio::test]
    async fn test_upstream_response_is_json() {
        let response = GatewayResponse::Upstream(vec![Order {
            id: "7".into(),
            name: "Order7".into(),
            amount: 200,
        }])
        .into_response();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], br#"[{"id":"7","name":"Order7","amount":200}]"#);
    }
}

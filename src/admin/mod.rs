//! Admin API.
//!
//! Read-only operational views, mounted only when `admin.enabled` is set and
//! guarded by a static bearer key.

pub mod auth;
pub mod handlers;

use axum::{middleware, routing::get, Router};
use std::sync::Arc;

use crate::resilience::CircuitBreaker;
use self::auth::admin_auth_middleware;
use self::handlers::{get_breaker, get_status};

/// State shared by the admin routes.
#[derive(Clone)]
pub struct AdminState {
    pub breaker: Arc<CircuitBreaker>,
    api_key: Arc<str>,
}

impl AdminState {
    pub fn new(breaker: Arc<CircuitBreaker>, api_key: &str) -> Self {
        Self {
            breaker,
            api_key: Arc::from(api_key),
        }
    }

    pub(crate) fn api_key(&self) -> &str {
        &self.api_key
    }
}

pub fn setup_admin_router(state: AdminState) -> Router {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/breaker", get(get_breaker))
        .layer(middleware::from_fn_with_state(state.clone(), admin_auth_middleware))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CircuitBreakerConfig;
    use crate::resilience::{Outcome, Phase};
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use tower::ServiceExt;

    fn router() -> (Router, Arc<CircuitBreaker>) {
        let breaker = Arc::new(CircuitBreaker::new("order-service", CircuitBreakerConfig::default()));
        (setup_admin_router(AdminState::new(breaker.clone(), "secret")), breaker)
    }

    fn request(path: &str, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::get(path);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_rejects_missing_or_wrong_key() {
        let (router, _) = router();

        let response = router.clone().oneshot(request("/admin/breaker", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = router.oneshot(request("/admin/breaker", Some("nope"))).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_breaker_snapshot() {
        let (router, breaker) = router();
        breaker.record_result(Outcome::Failure);

        let response = router.oneshot(request("/admin/breaker", Some("secret"))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["name"], "order-service");
        assert_eq!(json["phase"], "closed");
        assert_eq!(json["failures"], 1);
        assert_eq!(json["window_capacity"], 10);
        assert_eq!(breaker.phase(), Phase::Closed);
    }

    #[tokio::test]
    async fn test_status() {
        let (router, _) = router();
        let response = router.oneshot(request("/admin/status", Some("secret"))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "operational");
        assert_eq!(json["breaker_phase"], "closed");
    }
}

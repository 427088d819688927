//! Degraded responses.
//!
//! Built without I/O from the reason alone, so the same reason always yields
//! the same bytes. The `x-gateway-fallback` header lets callers tell a
//! fallback apart from a real upstream answer.

use axum::http::{header, HeaderName, StatusCode};
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::upstream::FailureKind;

pub const X_GATEWAY_FALLBACK: HeaderName = HeaderName::from_static("x-gateway-fallback");

/// Why the gateway is not returning upstream data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FallbackReason {
    /// The breaker denied the call; nothing was sent upstream.
    #[error("circuit breaker is open")]
    BreakerOpen,

    #[error("{0}")]
    Failure(FailureKind),

    #[error("upstream call timed out")]
    Timeout,
}

impl FallbackReason {
    /// Value of the marker header.
    pub fn marker(&self) -> &'static str {
        match self {
            FallbackReason::BreakerOpen => "breaker-open",
            FallbackReason::Failure(_) => "upstream-failure",
            FallbackReason::Timeout => "upstream-timeout",
        }
    }
}

/// A 503 answer in place of upstream data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackResponse {
    pub status: StatusCode,
    pub marker: &'static str,
    pub body: String,
}

impl IntoResponse for FallbackResponse {
    fn into_response(self) -> Response {
        (
            self.status,
            [
                (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
                (X_GATEWAY_FALLBACK, self.marker),
            ],
            self.body,
        )
            .into_response()
    }
}

/// Builds fallback responses for one upstream.
#[derive(Debug, Clone)]
pub struct FallbackComposer {
    message: String,
}

impl FallbackComposer {
    pub fn new(upstream: &str) -> Self {
        Self {
            message: format!(
                "The upstream service ({}) is currently unavailable. Please try again later.",
                upstream
            ),
        }
    }

    pub fn build(&self, reason: &FallbackReason) -> FallbackResponse {
        FallbackResponse {
            status: StatusCode::SERVICE_UNAVAILABLE,
            marker: reason.marker(),
            body: self.message.clone(),
        }
    }
}

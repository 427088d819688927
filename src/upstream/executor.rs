//! Bounded upstream invocation.
//!
//! # Responsibilities
//! - Issue GET {base_url}{path} through the transport
//! - Enforce the call deadline over the whole invocation, retries included
//! - Map every outcome into a [`CallResult`] value
//!
//! # Design Decisions
//! - Uses Tokio's timeout; on expiry the in-flight future is dropped, which
//!   cancels the request on a best-effort basis and discards any late answer
//! - Never returns an error or panics; failures are values

use axum::body::Body;
use axum::http::{header, uri::InvalidUri, HeaderValue, Method, Request, Uri};
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;

use crate::config::UpstreamConfig;
use crate::http::X_REQUEST_ID;
use crate::observability::metrics;
use crate::resilience::RetryPolicy;
use crate::upstream::result::{CallResult, FailureKind};
use crate::upstream::transport::Transport;

/// The executor could not be built from configuration.
#[derive(Debug, Error)]
#[error("invalid upstream endpoint '{endpoint}': {source}")]
pub struct InvalidEndpoint {
    pub endpoint: String,
    #[source]
    pub source: InvalidUri,
}

/// Per-call context carried to the upstream.
#[derive(Debug, Clone, Default)]
pub struct UpstreamRequest {
    pub request_id: Option<String>,
}

impl UpstreamRequest {
    pub fn with_request_id(request_id: impl Into<String>) -> Self {
        Self {
            request_id: Some(request_id.into()),
        }
    }
}

/// Performs upstream calls with a deadline and optional retries.
pub struct CallExecutor<T> {
    transport: T,
    upstream: String,
    endpoint: Uri,
    call_timeout: Duration,
    max_body_bytes: usize,
    retry: RetryPolicy,
}

impl<T: Transport> CallExecutor<T> {
    pub fn new(
        transport: T,
        upstream: &UpstreamConfig,
        call_timeout: Duration,
        retry: RetryPolicy,
    ) -> Result<Self, InvalidEndpoint> {
        let endpoint = upstream.endpoint();
        let uri = endpoint
            .parse::<Uri>()
            .map_err(|source| InvalidEndpoint { endpoint, source })?;

        Ok(Self {
            transport,
            upstream: upstream.name.clone(),
            endpoint: uri,
            call_timeout,
            max_body_bytes: upstream.max_body_bytes,
            retry,
        })
    }

    pub fn endpoint(&self) -> &Uri {
        &self.endpoint
    }

    pub fn call_timeout(&self) -> Duration {
        self.call_timeout
    }

    /// Call the upstream and decode its JSON body as `P`.
    pub async fn invoke<P>(&self, request: &UpstreamRequest) -> CallResult<P>
    where
        P: DeserializeOwned + Send,
    {
        let result = match tokio::time::timeout(self.call_timeout, self.attempt_all(request)).await {
            Ok(Ok(payload)) => CallResult::Success(payload),
            Ok(Err(failure)) => {
                tracing::warn!(
                    upstream = %self.upstream,
                    request_id = request.request_id.as_deref().unwrap_or("unknown"),
                    error = %failure,
                    "Upstream call failed"
                );
                CallResult::Failure(failure)
            }
            Err(_) => {
                tracing::warn!(
                    upstream = %self.upstream,
                    request_id = request.request_id.as_deref().unwrap_or("unknown"),
                    timeout = ?self.call_timeout,
                    "Upstream call timed out"
                );
                CallResult::Timeout
            }
        };

        metrics::record_upstream_call(&self.upstream, result.label());
        result
    }

    async fn attempt_all<P: DeserializeOwned>(&self, request: &UpstreamRequest) -> Result<P, FailureKind> {
        let mut attempt = 1;
        loop {
            match self.attempt(request).await {
                Ok(payload) => return Ok(payload),
                Err(failure) if self.retry.should_retry(attempt, &failure) => {
                    let delay = self.retry.delay_after(attempt);
                    tracing::info!(
                        upstream = %self.upstream,
                        attempt,
                        delay = ?delay,
                        error = %failure,
                        "Retrying upstream call"
                    );
                    metrics::record_retry(&self.upstream);
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(failure) => return Err(failure),
            }
        }
    }

    async fn attempt<P: DeserializeOwned>(&self, request: &UpstreamRequest) -> Result<P, FailureKind> {
        let mut outbound = Request::builder()
            .method(Method::GET)
            .uri(self.endpoint.clone())
            .header(header::ACCEPT, "application/json");

        if let Some(value) = request
            .request_id
            .as_deref()
            .and_then(|id| HeaderValue::from_str(id).ok())
        {
            outbound = outbound.header(X_REQUEST_ID, value);
        }

        let outbound = outbound
            .body(Body::empty())
            .map_err(|e| FailureKind::Transport(e.to_string()))?;

        let response = self
            .transport
            .send(outbound)
            .await
            .map_err(|e| FailureKind::Transport(e.0))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FailureKind::UpstreamStatus(status.as_u16()));
        }

        let bytes = axum::body::to_bytes(response.into_body(), self.max_body_bytes)
            .await
            .map_err(|e| FailureKind::MalformedBody(format!("unreadable body: {}", e)))?;

        serde_json::from_slice(&bytes).map_err(|e| FailureKind::MalformedBody(e.to_string()))
    }
}

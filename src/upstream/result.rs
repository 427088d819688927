//! Outcome of one upstream invocation.

use thiserror::Error;

use crate::resilience::Outcome;

/// Why an upstream call failed. Every variant counts against the breaker.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FailureKind {
    /// Connection refused, reset, DNS failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// The upstream answered with a non-2xx status.
    #[error("upstream returned status {0}")]
    UpstreamStatus(u16),

    /// 2xx answer whose body could not be read or decoded.
    #[error("malformed upstream body: {0}")]
    MalformedBody(String),
}

impl FailureKind {
    pub fn label(&self) -> &'static str {
        match self {
            FailureKind::Transport(_) => "transport",
            FailureKind::UpstreamStatus(_) => "status",
            FailureKind::MalformedBody(_) => "malformed_body",
        }
    }
}

/// Result of [`CallExecutor::invoke`](crate::upstream::CallExecutor::invoke).
#[derive(Debug, Clone, PartialEq)]
pub enum CallResult<T> {
    Success(T),
    Failure(FailureKind),
    /// No answer within the call deadline.
    Timeout,
}

impl<T> CallResult<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, CallResult::Success(_))
    }

    /// Outcome fed to the breaker; timeouts are failures.
    pub fn outcome(&self) -> Outcome {
        if self.is_success() {
            Outcome::Success
        } else {
            Outcome::Failure
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CallResult::Success(_) => "success",
            CallResult::Failure(kind) => kind.label(),
            CallResult::Timeout => "timeout",
        }
    }
}

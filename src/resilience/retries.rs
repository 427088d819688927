//! Retry logic.
//!
//! # Responsibilities
//! - Decide whether a failed upstream attempt may be repeated
//! - Space attempts with exponential backoff + jitter
//!
//! # Design Decisions
//! - Only GET is issued upstream, so every attempt is idempotent
//! - Connection errors and 502/503/504 are retryable; other statuses and
//!   malformed bodies are not
//! - Retries happen inside the call deadline and the breaker sees one
//!   outcome per inbound request

use std::time::Duration;

use crate::config::RetryConfig;
use crate::resilience::backoff::backoff_delay;
use crate::upstream::result::FailureKind;

/// Attempt budget and spacing for one upstream invocation.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
    max_delay: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &RetryConfig) -> Self {
        if !config.enabled {
            return Self::disabled();
        }
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay: Duration::from_millis(config.base_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
        }
    }

    /// A single attempt, no retries.
    pub fn disabled() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Whether another attempt may follow attempt number `attempt` (1-based).
    pub fn should_retry(&self, attempt: u32, failure: &FailureKind) -> bool {
        attempt < self.max_attempts && is_retryable(failure)
    }

    /// Delay before the attempt following attempt number `attempt`.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        backoff_delay(attempt, self.base_delay, self.max_delay)
    }
}

/// Whether a failure is worth repeating.
pub fn is_retryable(failure: &FailureKind) -> bool {
    match failure {
        FailureKind::Transport(_) => true,
        FailureKind::UpstreamStatus(status) => matches!(status, 502 | 503 | 504),
        FailureKind::MalformedBody(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_failures() {
        assert!(is_retryable(&FailureKind::Transport("connection refused".into())));
        assert!(is_retryable(&FailureKind::UpstreamStatus(503)));
        assert!(is_retryable(&FailureKind::UpstreamStatus(504)));
        assert!(!is_retryable(&FailureKind::UpstreamStatus(500)));
        assert!(!is_retryable(&FailureKind::UpstreamStatus(404)));
        assert!(!is_retryable(&FailureKind::MalformedBody("eof".into())));
    }

    #[test]
    fn test_disabled_config_means_single_attempt() {
        let config = RetryConfig {
            enabled: false,
            max_attempts: 5,
            ..RetryConfig::default()
        };
        let policy = RetryPolicy::from_config(&config);
        assert_eq!(policy.max_attempts(), 1);
        assert!(!policy.should_retry(1, &FailureKind::UpstreamStatus(503)));
    }

    #[test]
    fn test_attempt_budget() {
        let config = RetryConfig {
            enabled: true,
            max_attempts: 3,
            ..RetryConfig::default()
        };
        let policy = RetryPolicy::from_config(&config);
        let failure = FailureKind::Transport("reset".into());
        assert!(policy.should_retry(1, &failure));
        assert!(policy.should_retry(2, &failure));
        assert!(!policy.should_retry(3, &failure));
        assert!(policy.delay_after(1) >= Duration::from_millis(100));
    }
}

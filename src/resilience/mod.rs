//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request:
//!     → circuit_breaker.rs (admit or deny; denied calls never reach the network)
//!     → [upstream executor] (deadline per invocation)
//!     → retries.rs + backoff.rs (repeat retryable failures inside the deadline)
//!     → circuit_breaker.rs (record the outcome through the permit)
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every upstream call has a deadline
//! - Circuit breaker prevents cascading failures
//! - window.rs keeps the rolling failure rate O(1)
//! - clock.rs lets tests drive time explicitly

pub mod backoff;
pub mod circuit_breaker;
pub mod clock;
pub mod retries;
pub mod window;

pub use circuit_breaker::{Admission, BreakerSnapshot, CircuitBreaker, Permit, Phase, Transition};
pub use clock::{Clock, ManualClock, SystemClock};
pub use retries::RetryPolicy;
pub use window::Outcome;
